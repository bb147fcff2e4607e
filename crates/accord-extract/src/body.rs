//! Request body reading and decoding.
//!
//! Bodies are read with an optional size limit, then decoded by content
//! type into the JSON value a body schema sees:
//!
//! | Content type | Value |
//! |---|---|
//! | empty body | `null` |
//! | `application/json`, `*/*+json` | parsed JSON (`invalid_json` issue on failure) |
//! | `application/x-www-form-urlencoded` | object of fields |
//! | `multipart/form-data` | object of fields, see [`multipart`](crate::multipart) |
//! | anything else, UTF-8 | string |
//! | anything else, not UTF-8 | `null`, or an `invalid_encoding` issue under a schema |

use accord_core::{codes, Issue, Issues};
use accord_platform::{Body, PlatformResult};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde_json::Value;

use crate::multipart::{decode_multipart, MultipartConfig, UploadedFile};
use crate::query::{decode_query, QueryMode};

/// The broad class of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// JSON.
    Json,
    /// URL-encoded form.
    Form,
    /// Multipart form.
    Multipart,
    /// Anything else.
    Other,
}

impl BodyKind {
    /// Classifies a `content-type` header value. A missing content type is
    /// treated as JSON.
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::Json;
        };
        let Ok(mime) = content_type.parse::<mime::Mime>() else {
            return Self::Other;
        };
        match (mime.type_(), mime.subtype(), mime.suffix()) {
            (mime::APPLICATION, mime::JSON, _) | (_, _, Some(mime::JSON)) => Self::Json,
            (mime::APPLICATION, mime::WWW_FORM_URLENCODED, _) => Self::Form,
            (mime::MULTIPART, mime::FORM_DATA, _) => Self::Multipart,
            _ => Self::Other,
        }
    }
}

/// Reads a body into memory.
///
/// Returns `Ok(None)` as soon as more than `limit` bytes have been seen;
/// the rest of the body is not read.
pub async fn read_body(body: Body, limit: Option<usize>) -> PlatformResult<Option<Bytes>> {
    if let Some(len) = body.len() {
        if limit.is_some_and(|limit| len > limit) {
            return Ok(None);
        }
        return body.collect().await.map(Some);
    }

    let mut stream = body.into_stream();
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if limit.is_some_and(|limit| buf.len() + chunk.len() > limit) {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Some(buf.freeze()))
}

/// A decoded body and any files it carried.
#[derive(Debug, Clone, Default)]
pub struct DecodedBody {
    /// The value a body schema validates.
    pub value: Value,
    /// Files from a multipart body.
    pub files: Vec<UploadedFile>,
}

impl DecodedBody {
    fn value(value: Value) -> Self {
        Self {
            value,
            files: Vec::new(),
        }
    }
}

/// Decodes body bytes by content type.
///
/// `strict` makes undecodable binary bodies an issue instead of `null`;
/// `is_array` tells form decoding which fields collect repeated values.
pub async fn decode_body<F>(
    bytes: Bytes,
    content_type: Option<&str>,
    strict: bool,
    multipart: &MultipartConfig,
    is_array: F,
) -> Result<DecodedBody, Issues>
where
    F: Fn(&str) -> bool + Send,
{
    if bytes.is_empty() {
        return Ok(DecodedBody::value(Value::Null));
    }

    match BodyKind::from_content_type(content_type) {
        BodyKind::Json => serde_json::from_slice::<Value>(&bytes)
            .map(DecodedBody::value)
            .map_err(|error| {
                Issues::single(Issue::new(
                    codes::INVALID_JSON,
                    format!("Invalid JSON body: {error}"),
                ))
            }),
        BodyKind::Form => {
            let text = utf8(bytes, strict)?;
            Ok(DecodedBody::value(match text {
                Some(text) => decode_form(&text, &is_array),
                None => Value::Null,
            }))
        }
        BodyKind::Multipart => {
            let content_type = content_type.unwrap_or_default();
            let (value, files) = decode_multipart(content_type, bytes, multipart, is_array).await?;
            Ok(DecodedBody { value, files })
        }
        BodyKind::Other => Ok(DecodedBody::value(
            utf8(bytes, strict)?.map_or(Value::Null, Value::String),
        )),
    }
}

fn decode_form(text: &str, is_array: &dyn Fn(&str) -> bool) -> Value {
    decode_query(Some(text), QueryMode::Standard, is_array)
}

fn utf8(bytes: Bytes, strict: bool) -> Result<Option<String>, Issues> {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Ok(Some(text)),
        Err(_) if strict => Err(Issues::single(Issue::new(
            codes::INVALID_ENCODING,
            "Body is not valid UTF-8",
        ))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn decode(bytes: &'static [u8], content_type: Option<&str>, strict: bool) -> Result<Value, Issues> {
        decode_body(
            Bytes::from_static(bytes),
            content_type,
            strict,
            &MultipartConfig::default(),
            |_| false,
        )
            .await
            .map(|decoded| decoded.value)
    }

    #[test]
    fn test_body_kind() {
        assert_eq!(BodyKind::from_content_type(None), BodyKind::Json);
        assert_eq!(
            BodyKind::from_content_type(Some("application/json; charset=utf-8")),
            BodyKind::Json
        );
        assert_eq!(
            BodyKind::from_content_type(Some("application/problem+json")),
            BodyKind::Json
        );
        assert_eq!(
            BodyKind::from_content_type(Some("application/x-www-form-urlencoded")),
            BodyKind::Form
        );
        assert_eq!(
            BodyKind::from_content_type(Some("multipart/form-data; boundary=x")),
            BodyKind::Multipart
        );
        assert_eq!(BodyKind::from_content_type(Some("text/plain")), BodyKind::Other);
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        assert_eq!(decode(b"", Some("application/json"), true).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_json_body() {
        assert_eq!(
            decode(br#"{"title":"t"}"#, Some("application/json"), true).await.unwrap(),
            json!({"title": "t"})
        );
        let issues = decode(b"{oops", Some("application/json"), true).await.unwrap_err();
        assert_eq!(issues.issues[0].code, codes::INVALID_JSON);
    }

    #[tokio::test]
    async fn test_form_body() {
        assert_eq!(
            decode(b"title=Hello+world&draft=true", Some("application/x-www-form-urlencoded"), true)
                .await
                .unwrap(),
            json!({"title": "Hello world", "draft": "true"})
        );
    }

    #[tokio::test]
    async fn test_text_and_binary_bodies() {
        assert_eq!(decode(b"hello", Some("text/plain"), true).await.unwrap(), json!("hello"));
        assert_eq!(
            decode(&[0xff, 0xfe], Some("application/octet-stream"), false).await.unwrap(),
            Value::Null
        );
        let issues = decode(&[0xff, 0xfe], Some("application/octet-stream"), true)
            .await
            .unwrap_err();
        assert_eq!(issues.issues[0].code, codes::INVALID_ENCODING);
    }

    #[tokio::test]
    async fn test_read_body_limits() {
        let body = Body::from_chunks(vec![Bytes::from_static(b"abc"), Bytes::from_static(b"def")]);
        assert_eq!(read_body(body, Some(6)).await.unwrap().unwrap().as_ref(), b"abcdef");

        let body = Body::from_chunks(vec![Bytes::from_static(b"abc"), Bytes::from_static(b"def")]);
        assert!(read_body(body, Some(5)).await.unwrap().is_none());

        assert!(read_body(Body::text("toolong"), Some(3)).await.unwrap().is_none());
        assert!(read_body(Body::Empty, None).await.unwrap().unwrap().is_empty());
    }
}
