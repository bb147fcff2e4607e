//! Executing prepared requests.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use reqwest::multipart::{Form, Part};

use crate::args::FormValue;
use crate::builder::{PreparedBody, PreparedRequest};
use crate::error::{ClientError, ClientResult};

/// A response as it came off the wire, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

/// Sends a [`PreparedRequest`] and returns what came back.
///
/// Implementations must not retry; dropping the returned future aborts the
/// call.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends the request.
    async fn send(&self, request: PreparedRequest) -> ClientResult<RawResponse>;
}

/// The default transport, backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing `reqwest` client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with a connection timeout and pooled connections.
    pub fn with_connect_timeout(timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(100)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> ClientResult<RawResponse> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, &url).headers(headers);
        builder = match body {
            PreparedBody::Empty => builder,
            PreparedBody::Bytes(bytes) => builder.body(bytes),
            PreparedBody::Multipart(fields) => builder.multipart(multipart_form(fields)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn multipart_form(fields: Vec<(String, FormValue)>) -> ClientResult<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = match value {
            FormValue::Text(text) => form.text(name, text),
            FormValue::File(file) => {
                let mut part = Part::stream(file.data);
                if let Some(file_name) = file.file_name {
                    part = part.file_name(file_name);
                }
                if let Some(content_type) = &file.content_type {
                    part = part.mime_str(content_type)?;
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::FilePart;

    #[test]
    fn test_multipart_form_rejects_bad_mime() {
        let fields = vec![(
            "file".to_string(),
            FormValue::File(FilePart::new("a", "b").content_type("not a mime")),
        )];
        assert!(matches!(multipart_form(fields), Err(ClientError::Request(_))));
    }

    #[test]
    fn test_multipart_form_builds() {
        let fields = vec![
            ("title".to_string(), FormValue::Text("t".to_string())),
            (
                "file".to_string(),
                FormValue::File(FilePart::new("a.txt", "abc").content_type("text/plain")),
            ),
        ];
        let form = multipart_form(fields).unwrap();
        assert!(!form.boundary().is_empty());
    }
}
