//! Test response wrapper.

use std::fmt;

use accord_platform::UniversalResponse;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A fully read response with helper methods for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Reads a universal response into memory, draining stream bodies.
    pub async fn from_universal(response: UniversalResponse) -> Result<Self, TestError> {
        let (status, headers, body) = response.into_parts();
        let body = body.collect().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Asserts that the status code equals `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match; the body is included in
    /// the message.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {expected}, got {} with body {}",
            self.status.as_u16(),
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(actual, expected, "Header '{name}'");
        self
    }

    /// Asserts that a header is absent.
    ///
    /// # Panics
    ///
    /// Panics if the header is present.
    pub fn assert_no_header(&self, name: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        assert!(
            self.header(name).is_none(),
            "Header '{name}' should be absent, got {:?}",
            self.header(name)
        );
        self
    }

    /// Asserts that the body equals the expected string.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't match.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        assert_eq!(String::from_utf8_lossy(&self.body), expected.as_ref(), "Body mismatch");
        self
    }

    /// Asserts that the JSON body matches the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or doesn't match.
    pub fn assert_json_eq(&self, expected: &Value) -> &Self {
        let actual: Value = match self.json() {
            Ok(value) => value,
            Err(err) => panic!("Body should be valid JSON: {err}"),
        };
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts that the JSON value at a dotted path equals `expected`.
    ///
    /// Numeric segments index arrays: `bodyErrors.issues.0.code`.
    ///
    /// # Panics
    ///
    /// Panics if the path doesn't exist or doesn't match.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &Value) -> &Self {
        let path = path.as_ref();
        let json: Value = match self.json() {
            Ok(value) => value,
            Err(err) => panic!("Body should be valid JSON: {err}"),
        };
        let actual = json_path(&json, path)
            .unwrap_or_else(|| panic!("JSON path '{path}' not found in: {json}"));
        assert_eq!(actual, expected, "JSON field '{path}'");
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match segment.parse::<usize>() {
            Ok(index) if current.is_array() => current.get(index)?,
            _ => current.get(segment)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_platform::Body;
    use serde_json::json;

    fn create_response(status: u16, body: &str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(body.to_string()),
        )
    }

    #[tokio::test]
    async fn test_from_streamed_universal_response() {
        let response = UniversalResponse::stream(
            StatusCode::OK,
            "text/plain",
            Body::from_chunks(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]),
        );
        let response = TestResponse::from_universal(response).await.unwrap();
        response.assert_status(200).assert_body_eq("ab");
        assert_eq!(response.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_status_and_headers() {
        let response = create_response(201, "{}");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.is_success());
        response
            .assert_status(201)
            .assert_header("Content-Type", "application/json")
            .assert_no_header("location");
    }

    #[test]
    fn test_json() {
        let response = create_response(200, r#"{"name":"Alice","age":30}"#);
        let value = response.json_value().unwrap();
        assert_eq!(value["name"], "Alice");
        response.assert_json_eq(&json!({"name": "Alice", "age": 30}));
    }

    #[test]
    fn test_assert_json_field() {
        let response = create_response(400, r#"{"bodyErrors":{"issues":[{"code":"too_small"}]}}"#);
        response.assert_json_field("bodyErrors.issues.0.code", &json!("too_small"));
    }

    #[test]
    fn test_json_path() {
        let value = json!({"user": {"tags": ["admin"], "0": "zero"}});
        assert_eq!(json_path(&value, "user.tags.0"), Some(&json!("admin")));
        assert_eq!(json_path(&value, "user.0"), Some(&json!("zero")));
        assert_eq!(json_path(&value, "missing"), None);
    }

    #[test]
    #[should_panic(expected = "Expected status 200")]
    fn test_assert_status_panics() {
        create_response(500, "{}").assert_status(200);
    }
}
