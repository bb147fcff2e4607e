//! The response pipeline: handler output to [`UniversalResponse`].
//!
//! | Declared response | Body handling |
//! |---|---|
//! | `NoBody` | always empty, no `content-type`/`content-length` |
//! | `Other { content_type }` | raw text or bytes with the declared type |
//! | `Json` or undeclared | JSON-encoded; bytes and streams written raw |
//!
//! Schemas are only consulted for declared statuses, and only when
//! response validation is enabled.

use accord_core::{
    codes, HandlerOutcome, HandlerResponse, Issue, Issues, ResponseBody, ResponseSpec,
    ResponseValidationError, Route, SchemaRef, ValidationMode,
};
use accord_platform::{Body, UniversalResponse};
use http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};

const OCTET_STREAM: &str = "application/octet-stream";

/// Renders a handler outcome for `route`.
///
/// `context_headers` are the headers collected on the request context; the
/// handler's own headers take precedence over them.
///
/// # Errors
///
/// Returns [`ResponseValidationError`] when the status is not a valid HTTP
/// status or, with `validate` set, when the body breaks the declared schema.
pub async fn render(
    route: &Route,
    outcome: HandlerOutcome,
    context_headers: HeaderMap,
    validate: bool,
) -> Result<UniversalResponse, ResponseValidationError> {
    let HandlerResponse {
        status,
        headers,
        body,
    } = outcome.into_response();

    let code = StatusCode::from_u16(status).map_err(|_| ResponseValidationError {
        status,
        issues: Issues::single(Issue::new(
            codes::CUSTOM,
            format!("{status} is not a valid HTTP status"),
        )),
    })?;

    let handler_content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let schema = if validate {
        route.response(status).and_then(ResponseSpec::schema)
    } else {
        None
    };

    let mut response = match route.response(status) {
        Some(ResponseSpec::NoBody) => UniversalResponse::new(code),
        Some(ResponseSpec::Other { content_type, .. }) => {
            render_other(code, content_type, body, schema, status).await?
        }
        Some(ResponseSpec::Json(_)) | None => {
            render_json(code, body, handler_content_type.as_deref(), schema, status).await?
        }
    };

    overlay(response.headers_mut(), context_headers);
    overlay(response.headers_mut(), headers);

    if route.response(status).is_some_and(ResponseSpec::is_no_body) {
        response.clear_body();
    }
    Ok(response)
}

async fn render_json(
    code: StatusCode,
    body: ResponseBody,
    content_type: Option<&str>,
    schema: Option<&SchemaRef>,
    status: u16,
) -> Result<UniversalResponse, ResponseValidationError> {
    Ok(match body {
        ResponseBody::Json(value) => {
            UniversalResponse::json(code, checked(schema, value, status).await?)
        }
        ResponseBody::Text(text) => {
            UniversalResponse::json(code, checked(schema, Value::String(text), status).await?)
        }
        ResponseBody::Empty => {
            checked(schema, Value::Null, status).await?;
            UniversalResponse::new(code)
        }
        ResponseBody::Bytes(bytes) => {
            UniversalResponse::binary(code, content_type.unwrap_or(OCTET_STREAM), bytes)
        }
        ResponseBody::Stream(stream) => UniversalResponse::stream(
            code,
            content_type.unwrap_or(OCTET_STREAM),
            Body::Stream(stream),
        ),
    })
}

async fn render_other(
    code: StatusCode,
    content_type: &str,
    body: ResponseBody,
    schema: Option<&SchemaRef>,
    status: u16,
) -> Result<UniversalResponse, ResponseValidationError> {
    Ok(match body {
        ResponseBody::Text(text) => match checked(schema, Value::String(text), status).await? {
            Value::String(text) => UniversalResponse::text(code, content_type, text),
            other => UniversalResponse::text(code, content_type, other.to_string()),
        },
        ResponseBody::Json(value) => match checked(schema, value, status).await? {
            Value::String(text) => UniversalResponse::text(code, content_type, text),
            other => UniversalResponse::text(code, content_type, other.to_string()),
        },
        ResponseBody::Bytes(bytes) => UniversalResponse::binary(code, content_type, bytes),
        ResponseBody::Stream(stream) => {
            UniversalResponse::stream(code, content_type, Body::Stream(stream))
        }
        ResponseBody::Empty => {
            let mut response = UniversalResponse::new(code);
            response.set_content_type(content_type);
            response
        }
    })
}

async fn checked(
    schema: Option<&SchemaRef>,
    value: Value,
    status: u16,
) -> Result<Value, ResponseValidationError> {
    match schema {
        Some(schema) => schema
            .validate(value, ValidationMode::Strip)
            .await
            .map_err(|issues| ResponseValidationError { status, issues }),
        None => Ok(value),
    }
}

/// Copies `layer` onto `target`, replacing every header `layer` names.
/// Content headers belong to the pipeline and are skipped.
fn overlay(target: &mut HeaderMap, layer: HeaderMap) {
    let mut current: Option<HeaderName> = None;
    for (name, value) in layer {
        if let Some(name) = name {
            if name != CONTENT_TYPE && name != CONTENT_LENGTH {
                target.remove(&name);
            }
            current = Some(name);
        }
        match &current {
            Some(name) if *name != CONTENT_TYPE && *name != CONTENT_LENGTH => {
                target.append(name.clone(), value);
            }
            _ => {}
        }
    }
}

/// The opaque answer to a response that broke its contract.
#[must_use]
pub fn internal_error() -> UniversalResponse {
    UniversalResponse::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"message": "Internal server error"}),
    )
}

/// The answer to a request no route matched.
#[must_use]
pub fn not_found() -> UniversalResponse {
    UniversalResponse::json(StatusCode::NOT_FOUND, json!({"message": "Not found"}))
}

/// The answer to a request whose handler ran out of time.
#[must_use]
pub fn timed_out() -> UniversalResponse {
    UniversalResponse::json(
        StatusCode::GATEWAY_TIMEOUT,
        json!({"message": "Handler execution timed out"}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::Schema;
    use bytes::Bytes;
    use http::HeaderValue;

    fn route() -> Route {
        Route::get("/posts/:id")
            .response(
                200,
                ResponseSpec::json(Schema::object([
                    ("id", Schema::string()),
                    ("title", Schema::string()),
                ])),
            )
            .response(204, ResponseSpec::no_body())
            .response(201, ResponseSpec::other("text/csv"))
            .build()
            .unwrap()
    }

    async fn run(response: HandlerResponse, validate: bool) -> Result<UniversalResponse, ResponseValidationError> {
        render(&route(), response.into(), HeaderMap::new(), validate).await
    }

    #[tokio::test]
    async fn test_json_response_is_validated_and_stripped() {
        let response = run(
            HandlerResponse::json(200, json!({"id": "1", "title": "t", "secret": "x"})),
            true,
        )
        .await
        .unwrap();
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json_body(), Some(&json!({"id": "1", "title": "t"})));
    }

    #[tokio::test]
    async fn test_invalid_json_response() {
        let error = run(HandlerResponse::json(200, json!({"id": 1})), true)
            .await
            .unwrap_err();
        assert_eq!(error.status, 200);
        assert!(!error.issues.is_empty());

        let response = run(HandlerResponse::json(200, json!({"id": 1})), false)
            .await
            .unwrap();
        assert_eq!(response.json_body(), Some(&json!({"id": 1})));
    }

    #[tokio::test]
    async fn test_no_body_drops_content() {
        let response = run(
            HandlerResponse::json(204, json!({"ignored": true}))
                .with_header(CONTENT_LENGTH, HeaderValue::from_static("16")),
            true,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.content_type().is_none());
        assert!(response.header("content-length").is_none());
    }

    #[tokio::test]
    async fn test_other_content_type_written_raw() {
        let response = run(HandlerResponse::text(201, "a,b\n1,2\n"), true)
            .await
            .unwrap();
        assert_eq!(response.content_type(), Some("text/csv"));
        assert_eq!(response.into_bytes().await.unwrap().as_ref(), b"a,b\n1,2\n");

        let response = run(HandlerResponse::json(201, json!("raw")), true)
            .await
            .unwrap();
        assert_eq!(response.into_bytes().await.unwrap().as_ref(), b"raw");
    }

    #[tokio::test]
    async fn test_undeclared_status_passes_through() {
        let response = run(HandlerResponse::json(418, json!({"anything": 1})), true)
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 418);
        assert_eq!(response.json_body(), Some(&json!({"anything": 1})));
    }

    #[tokio::test]
    async fn test_invalid_status() {
        let error = run(HandlerResponse::new(1000), false).await.unwrap_err();
        assert_eq!(error.status, 1000);
    }

    #[tokio::test]
    async fn test_bytes_and_text_under_json() {
        let response = run(HandlerResponse::bytes(418, Bytes::from_static(&[1, 2, 3])), true)
            .await
            .unwrap();
        assert_eq!(response.content_type(), Some(OCTET_STREAM));

        let response = run(HandlerResponse::text(418, "hi"), true).await.unwrap();
        assert_eq!(response.json_body(), Some(&json!("hi")));
    }

    #[tokio::test]
    async fn test_stream_body_is_not_buffered() {
        let stream = Body::from_chunks(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
        let Body::Stream(stream) = stream else {
            panic!("expected a stream body");
        };
        let response = run(HandlerResponse::stream(418, stream), true).await.unwrap();
        assert!(response.body().is_stream());
        assert_eq!(response.into_bytes().await.unwrap().as_ref(), b"ab");
    }

    #[tokio::test]
    async fn test_header_precedence() {
        let mut context_headers = HeaderMap::new();
        context_headers.insert("x-trace", HeaderValue::from_static("ctx"));
        context_headers.insert("x-only-ctx", HeaderValue::from_static("1"));

        let handler = HandlerResponse::json(200, json!({"id": "1", "title": "t"}))
            .with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("handler"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = render(&route(), handler.into(), context_headers, true)
            .await
            .unwrap();
        assert_eq!(response.header("x-trace"), Some("handler"));
        assert_eq!(response.header("x-only-ctx"), Some("1"));
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_short_circuit_rendered_like_respond() {
        let outcome = HandlerOutcome::ShortCircuit(HandlerResponse::json(200, json!({"id": 1})));
        assert!(render(&route(), outcome, HeaderMap::new(), true).await.is_err());
    }
}
