//! The request validation pipeline.
//!
//! [`validate_request`] turns a matched request into the [`RequestInput`] a
//! handler receives. The four facets are decoded, then validated
//! concurrently; every failing facet is reported, never just the first.
//!
//! | Facet | Source | Mode |
//! |---|---|---|
//! | path params | matched template segments | [`ValidationMode::Passthrough`] |
//! | headers | lowercase names, repeats joined | [`ValidationMode::Passthrough`] |
//! | query | see [`query`](crate::query) | [`ValidationMode::Strip`] |
//! | body | see [`body`](crate::body) | [`ValidationMode::Strip`] |

use accord_core::{
    codes, BodySpec, Facet, Issue, Issues, RequestInput, RequestValidationError, Route,
    SchemaRef, ValidationMode,
};
use accord_platform::Body;
use accord_router::Params;
use bytes::Bytes;
use http::{header, HeaderMap};
use serde_json::{Map, Value};

use crate::body::{decode_body, read_body};
use crate::error::ExtractResult;
use crate::headers::headers_to_value;
use crate::multipart::{MultipartConfig, UploadedFiles};
use crate::query::{decode_query, QueryMode};

/// Options for the request pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// How query strings are decoded.
    pub query_mode: QueryMode,
    /// Largest accepted body in bytes; `None` means unlimited.
    pub max_body_size: Option<usize>,
    /// Limits for multipart bodies.
    pub multipart: MultipartConfig,
}

impl ValidationOptions {
    /// Sets the query mode.
    #[must_use]
    pub fn query_mode(mut self, mode: QueryMode) -> Self {
        self.query_mode = mode;
        self
    }

    /// Sets the body size limit.
    #[must_use]
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = Some(limit);
        self
    }

    /// Sets the multipart limits.
    #[must_use]
    pub fn multipart(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }
}

/// The parts of a request the pipeline reads.
#[derive(Debug)]
pub struct RequestParts<'a> {
    /// Parameters bound by the route template.
    pub params: &'a Params,
    /// Request headers.
    pub headers: &'a HeaderMap,
    /// Raw query string, without `?`.
    pub query: Option<&'a str>,
    /// Request body.
    pub body: Body,
}

/// A request that passed validation.
#[derive(Debug)]
pub struct ValidatedRequest {
    /// Validated facet values.
    pub input: RequestInput,
    /// Body bytes as received; empty for routes without a body.
    pub raw_body: Bytes,
    /// Files from a multipart body.
    pub files: UploadedFiles,
}

/// Validates a request against `route`.
///
/// # Errors
///
/// - [`ExtractError::Invalid`](crate::ExtractError::Invalid) with every
///   failing facet set
/// - [`ExtractError::BodyRead`](crate::ExtractError::BodyRead) if the body
///   stream fails
pub async fn validate_request(
    route: &Route,
    parts: RequestParts<'_>,
    options: &ValidationOptions,
) -> ExtractResult<ValidatedRequest> {
    let RequestParts {
        params,
        headers,
        query,
        body,
    } = parts;

    let (raw_body, oversized) = match route.body() {
        BodySpec::NoBody => (Bytes::new(), false),
        BodySpec::Unchecked | BodySpec::Schema(_) => match read_body(body, options.max_body_size).await? {
            Some(bytes) => (bytes, false),
            None => (Bytes::new(), true),
        },
    };

    let params_value = params_to_value(params);
    let headers_schema = route.headers_schema();
    let headers_value = headers_to_value(headers, |name| is_array(headers_schema, name));
    let query_schema = route.query_schema();
    let query_value = decode_query(query, options.query_mode, |key| is_array(query_schema, key));

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body_future = async {
        match route.body() {
            BodySpec::NoBody => Ok((Value::Null, Vec::new())),
            _ if oversized => Err(Issues::single(Issue::new(
                codes::TOO_BIG,
                format!(
                    "Body must be at most {} byte(s)",
                    options.max_body_size.unwrap_or_default()
                ),
            ))),
            BodySpec::Unchecked => decode_body(
                raw_body.clone(),
                content_type.as_deref(),
                false,
                &options.multipart,
                |_| false,
            )
            .await
            .map(|decoded| (decoded.value, decoded.files)),
            BodySpec::Schema(schema) => {
                let decoded = decode_body(
                    raw_body.clone(),
                    content_type.as_deref(),
                    true,
                    &options.multipart,
                    |key| schema.is_array_field(key),
                )
                .await?;
                let value = schema.validate(decoded.value, ValidationMode::Strip).await?;
                Ok((value, decoded.files))
            }
        }
    };

    let (params_result, headers_result, query_result, body_result) = futures_util::join!(
        run(route.path_params_schema(), params_value, ValidationMode::Passthrough),
        run(headers_schema, headers_value, ValidationMode::Passthrough),
        run(query_schema, query_value, ValidationMode::Strip),
        body_future,
    );

    let mut error = RequestValidationError::default();
    let params = settle(&mut error, Facet::PathParams, params_result);
    let headers = settle(&mut error, Facet::Headers, headers_result);
    let query = settle(&mut error, Facet::Query, query_result);
    let body = settle(&mut error, Facet::Body, body_result);

    if !error.is_empty() {
        tracing::debug!(
            route = %route,
            facets = ?error.failing_facets(),
            issues = error.issue_count(),
            "request failed validation"
        );
        return Err(error.into());
    }

    let (body, files) = body.unwrap_or_default();
    Ok(ValidatedRequest {
        input: RequestInput {
            params: params.unwrap_or_default(),
            query: query.unwrap_or_default(),
            headers: headers.unwrap_or_default(),
            body,
        },
        raw_body,
        files: files.into(),
    })
}

async fn run(schema: Option<&SchemaRef>, value: Value, mode: ValidationMode) -> Result<Value, Issues> {
    match schema {
        Some(schema) => schema.validate(value, mode).await,
        None => Ok(value),
    }
}

fn settle<T>(error: &mut RequestValidationError, facet: Facet, result: Result<T, Issues>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(issues) => {
            error.set(facet, issues);
            None
        }
    }
}

fn is_array(schema: Option<&SchemaRef>, key: &str) -> bool {
    schema.is_some_and(|schema| schema.is_array_field(key))
}

fn params_to_value(params: &Params) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect::<Map<String, Value>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractError;
    use accord_core::Schema;
    use http::HeaderValue;
    use serde_json::json;

    fn post_route() -> Route {
        Route::post("/posts/:id")
            .path_params(Schema::object([("id", Schema::integer().coerce())]))
            .headers(Schema::object([("x-api-key", Schema::string())]))
            .query(Schema::object([
                ("draft", Schema::boolean().coerce().optional()),
                ("tag", Schema::array(Schema::string()).optional()),
            ]))
            .body(Schema::object([("title", Schema::string().min_length(1))]))
            .build()
            .unwrap()
    }

    fn params(id: &str) -> Params {
        let mut params = Params::new();
        params.push("id", id);
        params
    }

    fn json_headers(api_key: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert("x-api-key", HeaderValue::from_static(key));
        }
        headers
    }

    async fn validate(
        route: &Route,
        params: &Params,
        headers: &HeaderMap,
        query: Option<&str>,
        body: Body,
    ) -> ExtractResult<ValidatedRequest> {
        validate_request(
            route,
            RequestParts {
                params,
                headers,
                query,
                body,
            },
            &ValidationOptions::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_valid_request() {
        let route = post_route();
        let headers = json_headers(Some("k"));
        let validated = validate(
            &route,
            &params("7"),
            &headers,
            Some("draft=true&tag=a&tag=b&extra=1"),
            Body::text(r#"{"title":"Hello","ignored":true}"#),
        )
        .await
        .unwrap();

        let input = validated.input;
        assert_eq!(input.params, json!({"id": 7}));
        assert_eq!(input.query, json!({"draft": true, "tag": ["a", "b"]}));
        assert_eq!(input.headers["x-api-key"], "k");
        assert_eq!(input.headers["content-type"], "application/json");
        assert_eq!(input.body, json!({"title": "Hello"}));
        assert_eq!(validated.raw_body.as_ref(), br#"{"title":"Hello","ignored":true}"#);
    }

    #[tokio::test]
    async fn test_all_failing_facets_reported() {
        let route = post_route();
        let headers = json_headers(None);
        let err = validate(
            &route,
            &params("abc"),
            &headers,
            None,
            Body::text(r#"{"title":""}"#),
        )
        .await
        .unwrap_err();

        let ExtractError::Invalid(error) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            error.failing_facets(),
            vec![Facet::PathParams, Facet::Headers, Facet::Body]
        );
        assert!(error.query.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_body_issue() {
        let route = post_route();
        let headers = json_headers(Some("k"));
        let err = validate(&route, &params("1"), &headers, None, Body::text("{"))
            .await
            .unwrap_err();
        let body = err.validation().and_then(|e| e.body.clone()).unwrap();
        assert_eq!(body.issues[0].code, codes::INVALID_JSON);
    }

    #[tokio::test]
    async fn test_no_body_ignores_content() {
        let route = Route::delete("/posts/:id").no_body().build().unwrap();
        let validated = validate(
            &route,
            &params("1"),
            &HeaderMap::new(),
            None,
            Body::text("ignored"),
        )
        .await
        .unwrap();
        assert_eq!(validated.input.body, Value::Null);
        assert!(validated.raw_body.is_empty());
    }

    #[tokio::test]
    async fn test_unchecked_body_passes_through() {
        let route = Route::post("/echo").build().unwrap();
        let headers = json_headers(None);
        let validated = validate(
            &route,
            &Params::new(),
            &headers,
            None,
            Body::text(r#"{"any":[1,2]}"#),
        )
        .await
        .unwrap();
        assert_eq!(validated.input.body, json!({"any": [1, 2]}));
        assert_eq!(validated.input.query, json!({}));
        assert_eq!(validated.input.params, json!({}));
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let route = Route::post("/echo").build().unwrap();
        let headers = json_headers(None);
        let err = validate_request(
            &route,
            RequestParts {
                params: &Params::new(),
                headers: &headers,
                query: None,
                body: Body::text(r#"{"a":"0123456789"}"#),
            },
            &ValidationOptions::default().max_body_size(8),
        )
        .await
        .unwrap_err();
        let body = err.validation().and_then(|e| e.body.clone()).unwrap();
        assert_eq!(body.issues[0].code, codes::TOO_BIG);
    }

    #[tokio::test]
    async fn test_json_query_mode() {
        let route = Route::get("/posts")
            .query(Schema::object([("take", Schema::integer()), ("q", Schema::string())]))
            .build()
            .unwrap();
        let validated = validate_request(
            &route,
            RequestParts {
                params: &Params::new(),
                headers: &HeaderMap::new(),
                query: Some("take=5&q=%225%22"),
                body: Body::Empty,
            },
            &ValidationOptions::default().query_mode(QueryMode::Json),
        )
        .await
        .unwrap();
        assert_eq!(validated.input.query, json!({"take": 5, "q": "5"}));
    }
}
