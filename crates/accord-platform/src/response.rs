//! Universal response.

use bytes::Bytes;
use futures_util::StreamExt;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{Body, PlatformError, PlatformResult};

/// The value a response body was produced from, before serialization.
///
/// Keeping it next to the wire body lets a response be inspected (for
/// example its JSON payload read back by a test or a post hook) and
/// re-serialized without parsing its own output.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawBody {
    /// No raw value retained.
    #[default]
    None,
    /// A JSON value.
    Json(Value),
    /// Text written verbatim.
    Text(String),
    /// Bytes written verbatim.
    Binary(Bytes),
}

/// A platform-agnostic HTTP response.
///
/// Status and headers are fixed before the body is handed to a transport,
/// which matters for streaming bodies: nothing about the head can change
/// once the first chunk has been pulled.
#[derive(Debug)]
pub struct UniversalResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    raw: RawBody,
}

impl UniversalResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::Empty,
            raw: RawBody::None,
        }
    }

    /// Creates a response from a numeric status.
    pub fn from_status_code(status: u16) -> PlatformResult<Self> {
        StatusCode::from_u16(status)
            .map(Self::new)
            .map_err(|_| PlatformError::InvalidStatus(status))
    }

    /// Creates a JSON response with `content-type: application/json`.
    #[must_use]
    pub fn json(status: StatusCode, value: Value) -> Self {
        let mut response = Self::new(status);
        response.set_json(value);
        response
    }

    /// Creates a text response with the given content type.
    #[must_use]
    pub fn text(status: StatusCode, content_type: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut response = Self::new(status);
        response.set_content_type(content_type);
        response.raw = RawBody::Text(text.clone());
        response.body = Body::Text(text);
        response
    }

    /// Creates a binary response with the given content type.
    #[must_use]
    pub fn binary(status: StatusCode, content_type: &str, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let mut response = Self::new(status);
        response.set_content_type(content_type);
        response.raw = RawBody::Binary(bytes.clone());
        response.body = Body::Binary(bytes);
        response
    }

    /// Creates a streaming response. No raw value is retained.
    #[must_use]
    pub fn stream(status: StatusCode, content_type: &str, body: Body) -> Self {
        let mut response = Self::new(status);
        response.set_content_type(content_type);
        response.body = body;
        response
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Replaces the status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the first value of a header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `content-type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Sets the `content-type` header. Invalid values are ignored.
    pub fn set_content_type(&mut self, content_type: &str) {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
    }

    /// Inserts a header, replacing existing values.
    pub fn insert_header(&mut self, name: &str, value: &str) -> PlatformResult<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| PlatformError::invalid_header(name))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| PlatformError::invalid_header(name))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Returns the wire body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns the retained raw value.
    #[must_use]
    pub fn raw_body(&self) -> &RawBody {
        &self.raw
    }

    /// Returns the retained JSON value, if the body was produced from one.
    #[must_use]
    pub fn json_body(&self) -> Option<&Value> {
        match &self.raw {
            RawBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Replaces the body with the serialization of `value`.
    pub fn set_json(&mut self, value: Value) {
        self.body = Body::Text(value.to_string());
        self.raw = RawBody::Json(value);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    /// Removes the body and the headers describing it.
    pub fn clear_body(&mut self) {
        self.body = Body::Empty;
        self.raw = RawBody::None;
        self.headers.remove(CONTENT_TYPE);
        self.headers.remove(CONTENT_LENGTH);
    }

    /// Drops the body but keeps every header, as a `HEAD` reply does.
    pub fn strip_body(&mut self) {
        self.body = Body::Empty;
        self.raw = RawBody::None;
    }

    /// Clones the response, raw value included. Streaming bodies cannot be
    /// cloned.
    pub fn try_clone(&self) -> PlatformResult<Self> {
        Ok(Self {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
            raw: self.raw.clone(),
        })
    }

    /// Splits the response into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }

    /// Reads the whole body into memory.
    pub async fn into_bytes(self) -> PlatformResult<Bytes> {
        self.body.collect().await
    }

    /// Writes the body to `writer` chunk by chunk.
    ///
    /// Each chunk is written completely before the next one is pulled from
    /// the body, so a writer that cannot keep up suspends the producer.
    pub async fn write_to<W>(self, writer: &mut W) -> PlatformResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut stream = self.body.into_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_response_retains_raw_value() {
        let response = UniversalResponse::json(StatusCode::CREATED, json!({"id": 1}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json_body(), Some(&json!({"id": 1})));
        assert!(matches!(response.body(), Body::Text(text) if text == r#"{"id":1}"#));
    }

    #[test]
    fn test_clone_preserves_raw_body() {
        let response = UniversalResponse::json(StatusCode::OK, json!({"a": [1, 2]}));
        let cloned = response.try_clone().unwrap();
        assert_eq!(cloned.raw_body(), response.raw_body());
        assert_eq!(cloned.body().as_bytes(), response.body().as_bytes());
    }

    #[test]
    fn test_stream_response_cannot_be_cloned() {
        let response = UniversalResponse::stream(
            StatusCode::OK,
            "text/plain",
            Body::from_chunks(vec![Bytes::from_static(b"a")]),
        );
        assert!(response.try_clone().is_err());
        assert_eq!(response.raw_body(), &RawBody::None);
    }

    #[test]
    fn test_clear_body_drops_describing_headers() {
        let mut response = UniversalResponse::text(StatusCode::OK, "text/plain", "hi");
        response.insert_header("content-length", "2").unwrap();
        response.clear_body();
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert!(response.headers().get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_strip_body_keeps_headers() {
        let mut response = UniversalResponse::json(StatusCode::OK, json!({"id": 1}));
        response.strip_body();
        assert!(response.body().is_empty());
        assert_eq!(response.json_body(), None);
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_invalid_status() {
        assert!(UniversalResponse::from_status_code(42).is_err());
        assert_eq!(
            UniversalResponse::from_status_code(418).unwrap().status(),
            StatusCode::IM_A_TEAPOT
        );
    }

    #[tokio::test]
    async fn test_write_to_streams_every_chunk() {
        let response = UniversalResponse::stream(
            StatusCode::OK,
            "application/octet-stream",
            Body::from_chunks(vec![
                Bytes::from_static(b"one,"),
                Bytes::from_static(b"two,"),
                Bytes::from_static(b"three"),
            ]),
        );

        let mut sink = Vec::new();
        let written = response.write_to(&mut sink).await.unwrap();
        assert_eq!(written, 13);
        assert_eq!(sink, b"one,two,three");
    }
}
