//! Classifying raw responses against a route's declared statuses.

use accord_core::{ResponseSpec, ResponseValidationError, Route, ValidationMode};
use accord_extract::body::BodyKind;
use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::transport::RawResponse;

/// How a response status relates to the route's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// The route declares this status; the body was parsed (and validated
    /// when enabled) per its declared response.
    Declared,
    /// Not declared by the route, whatever its strictness. Passed through
    /// untyped.
    Unknown,
}

impl StatusKind {
    /// Returns true for [`StatusKind::Declared`].
    #[must_use]
    pub const fn is_declared(self) -> bool {
        matches!(self, Self::Declared)
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseData {
    /// No body.
    #[default]
    Empty,
    /// A JSON body.
    Json(Value),
    /// A `text/*` body.
    Text(String),
    /// Anything else.
    Bytes(Bytes),
}

impl ResponseData {
    /// Returns the JSON value, if the body was JSON.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text, if the body was text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
            Self::Bytes(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// A classified response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    /// Status code.
    pub status: u16,
    /// How the status relates to the contract.
    pub kind: StatusKind,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded body.
    pub body: ResponseData,
}

impl ClientResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserializes a JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        let value = self.body.as_json().cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Classification switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Validate declared bodies against their schemas.
    pub validate_response: bool,
    /// Return undeclared statuses as [`ClientError::UnknownStatus`].
    pub throw_on_unknown_status: bool,
}

/// Classifies `raw` against `route`.
///
/// A status is declared iff it is a key of the route's responses. Declared
/// bodies are decoded strictly and, with `validate_response`, validated
/// with [`ValidationMode::Strip`]; the validated value replaces the body.
/// Undeclared bodies are decoded leniently and never validated.
///
/// # Errors
///
/// - [`ClientError::UnknownStatus`] for an undeclared status when
///   `throw_on_unknown_status` is set, whatever the route's strictness
/// - [`ClientError::InvalidResponseBody`] when a declared JSON body does
///   not parse
/// - [`ClientError::ResponseValidation`] when a declared body fails its
///   schema
pub async fn classify(
    route: &Route,
    raw: RawResponse,
    options: ClassifyOptions,
) -> ClientResult<ClientResponse> {
    let RawResponse {
        status,
        headers,
        body,
    } = raw;

    let Some(spec) = route.response(status) else {
        let data = decode_lenient(&headers, body);
        let response = ClientResponse {
            status,
            kind: StatusKind::Unknown,
            headers,
            body: data,
        };
        if options.throw_on_unknown_status {
            return Err(ClientError::UnknownStatus {
                response: Box::new(response),
            });
        }
        return Ok(response);
    };

    let mut data = decode_declared(status, spec, &headers, body)?;

    if options.validate_response {
        if let Some(schema) = spec.schema() {
            let validated = schema
                .validate(data.clone().into_value(), ValidationMode::Strip)
                .await
                .map_err(|issues| ResponseValidationError { status, issues })?;
            data = match (data, validated) {
                (ResponseData::Empty, Value::Null) => ResponseData::Empty,
                (ResponseData::Text(_), Value::String(text)) => ResponseData::Text(text),
                (ResponseData::Bytes(bytes), Value::String(_)) => ResponseData::Bytes(bytes),
                (_, value) => ResponseData::Json(value),
            };
        }
    }

    Ok(ClientResponse {
        status,
        kind: StatusKind::Declared,
        headers,
        body: data,
    })
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
}

fn is_text(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .is_some_and(|mime| mime.type_() == mime::TEXT)
}

fn decode_declared(
    status: u16,
    spec: &ResponseSpec,
    headers: &HeaderMap,
    body: Bytes,
) -> ClientResult<ResponseData> {
    if body.is_empty() || spec.is_no_body() {
        return Ok(ResponseData::Empty);
    }

    let content_type = content_type(headers);
    let json = match (spec, content_type) {
        (_, Some(ct)) => BodyKind::from_content_type(Some(ct)) == BodyKind::Json,
        (ResponseSpec::Json(_), None) => true,
        _ => false,
    };

    if json {
        return serde_json::from_slice(&body)
            .map(ResponseData::Json)
            .map_err(|err| ClientError::InvalidResponseBody {
                status,
                reason: err.to_string(),
            });
    }
    let declared_text = matches!(
        spec,
        ResponseSpec::Other { content_type, .. } if is_text(Some(content_type))
    );
    if is_text(content_type) || declared_text {
        return String::from_utf8(body.to_vec())
            .map(ResponseData::Text)
            .map_err(|err| ClientError::InvalidResponseBody {
                status,
                reason: err.to_string(),
            });
    }
    Ok(ResponseData::Bytes(body))
}

fn decode_lenient(headers: &HeaderMap, body: Bytes) -> ResponseData {
    if body.is_empty() {
        return ResponseData::Empty;
    }
    let content_type = content_type(headers);
    let json = BodyKind::from_content_type(content_type) == BodyKind::Json;
    if json {
        if let Ok(value) = serde_json::from_slice(&body) {
            return ResponseData::Json(value);
        }
    }
    if json || is_text(content_type) {
        if let Ok(text) = String::from_utf8(body.to_vec()) {
            return ResponseData::Text(text);
        }
    }
    ResponseData::Bytes(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::Schema;
    use http::HeaderValue;
    use serde_json::json;

    fn route(strict: bool) -> Route {
        Route::get("/posts/:id")
            .response(
                200,
                ResponseSpec::json(Schema::object([("id", Schema::integer())])),
            )
            .response(204, ResponseSpec::no_body())
            .response(201, ResponseSpec::other("text/csv"))
            .strict_status_codes(strict)
            .build()
            .unwrap()
    }

    fn raw(status: u16, content_type: Option<&str>, body: &'static [u8]) -> RawResponse {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(ct).unwrap());
        }
        RawResponse {
            status,
            headers,
            body: Bytes::from_static(body),
        }
    }

    const VALIDATE: ClassifyOptions = ClassifyOptions {
        validate_response: true,
        throw_on_unknown_status: false,
    };

    #[tokio::test]
    async fn test_declared_json_is_validated_and_stripped() {
        let response = classify(
            &route(false),
            raw(200, Some("application/json"), br#"{"id":1,"extra":true}"#),
            VALIDATE,
        )
        .await
        .unwrap();
        assert_eq!(response.kind, StatusKind::Declared);
        assert_eq!(response.body, ResponseData::Json(json!({"id": 1})));
    }

    #[tokio::test]
    async fn test_declared_without_validation_keeps_body() {
        let response = classify(
            &route(false),
            raw(200, Some("application/json"), br#"{"id":"x"}"#),
            ClassifyOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(response.body, ResponseData::Json(json!({"id": "x"})));
    }

    #[tokio::test]
    async fn test_declared_validation_failure() {
        let err = classify(
            &route(false),
            raw(200, Some("application/json"), br#"{"id":"x"}"#),
            VALIDATE,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::ResponseValidation(ref e) if e.status == 200));
    }

    #[tokio::test]
    async fn test_declared_invalid_json() {
        let err = classify(&route(false), raw(200, Some("application/json"), b"{"), VALIDATE)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponseBody { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_text_and_no_body() {
        let response = classify(&route(false), raw(201, Some("text/csv"), b"a,b"), VALIDATE)
            .await
            .unwrap();
        assert_eq!(response.body.as_text(), Some("a,b"));

        let response = classify(&route(false), raw(204, None, b""), VALIDATE)
            .await
            .unwrap();
        assert_eq!(response.body, ResponseData::Empty);
    }

    #[tokio::test]
    async fn test_undeclared_status_is_unknown_on_any_route() {
        let response = classify(
            &route(false),
            raw(418, Some("application/json"), br#"{"teapot":true}"#),
            VALIDATE,
        )
        .await
        .unwrap();
        assert_eq!(response.kind, StatusKind::Unknown);
        assert_eq!(response.body, ResponseData::Json(json!({"teapot": true})));

        let response = classify(&route(true), raw(418, Some("text/plain"), b"short"), VALIDATE)
            .await
            .unwrap();
        assert_eq!(response.kind, StatusKind::Unknown);
        assert_eq!(response.body.as_text(), Some("short"));
    }

    #[tokio::test]
    async fn test_undeclared_status_with_default_options() {
        let route = Route::get("/teapot")
            .response(200, ResponseSpec::json(Schema::any()))
            .build()
            .unwrap();
        let response = classify(&route, raw(418, None, b""), ClassifyOptions::default())
            .await
            .unwrap();
        assert_eq!(response.kind, StatusKind::Unknown);
        assert!(!response.kind.is_declared());
    }

    #[tokio::test]
    async fn test_throw_on_unknown_status_ignores_strictness() {
        let options = ClassifyOptions {
            validate_response: false,
            throw_on_unknown_status: true,
        };
        for strict in [false, true] {
            let err = classify(&route(strict), raw(500, Some("application/json"), b"not json"), options)
                .await
                .unwrap_err();
            let response = err.response().unwrap();
            assert_eq!(response.status, 500);
            assert_eq!(response.body.as_text(), Some("not json"));
        }
    }

    #[tokio::test]
    async fn test_binary_body() {
        let route = Route::get("/file")
            .response(200, ResponseSpec::other("application/pdf"))
            .build()
            .unwrap();
        let response = classify(&route, raw(200, Some("application/pdf"), &[0x25, 0xff]), VALIDATE)
            .await
            .unwrap();
        assert_eq!(response.body, ResponseData::Bytes(Bytes::from_static(&[0x25, 0xff])));
    }
}
