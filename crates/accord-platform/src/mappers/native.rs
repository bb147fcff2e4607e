//! Native `http` messages.
//!
//! Cloud-function runtimes built on hyper (and most Rust HTTP hosts) speak
//! `http::Request<B>` / `http::Response<B>`. Inbound bodies are left as a lazy
//! stream so nothing is read until the validation pipeline asks for it;
//! outbound streaming bodies are handed to the host as an `http_body::Body`
//! whose frames are pulled on demand.

use std::error::Error as StdError;
use std::io;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http::header::HOST;
use http::{Request, Response, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Body as HttpBody, Frame};

use crate::{Body, PlatformError, PlatformResult, UniversalRequest, UniversalResponse};

/// Body type of responses produced by [`response_to_http`].
pub type NativeBody = UnsyncBoxBody<Bytes, io::Error>;

/// Converts a native request into a universal request.
///
/// Relative request targets are made absolute from the `Host` header and
/// `default_scheme`. The body stays unread until consumed.
pub fn request_from_http<B>(request: Request<B>, default_scheme: &str) -> PlatformResult<UniversalRequest>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = request.into_parts();

    let uri = if parts.uri.scheme().is_some() {
        parts.uri
    } else if let Some(host) = parts.headers.get(HOST).and_then(|v| v.to_str().ok()) {
        let target = parts
            .uri
            .path_and_query()
            .map_or("/", http::uri::PathAndQuery::as_str);
        let url = format!("{default_scheme}://{host}{target}");
        url.parse::<Uri>()
            .map_err(|e| PlatformError::invalid_url(&url, e))?
    } else {
        parts.uri
    };

    let stream = body
        .into_data_stream()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e));

    Ok(UniversalRequest::new(
        parts.method,
        uri,
        parts.headers,
        Body::stream(stream),
    ))
}

/// Converts a universal response into a native response.
#[must_use]
pub fn response_to_http(response: UniversalResponse) -> Response<NativeBody> {
    let (status, headers, body) = response.into_parts();

    let body = match body {
        Body::Empty => Empty::<Bytes>::new()
            .map_err(|never| match never {})
            .boxed_unsync(),
        Body::Text(text) => Full::new(Bytes::from(text))
            .map_err(|never| match never {})
            .boxed_unsync(),
        Body::Binary(bytes) => Full::new(bytes)
            .map_err(|never| match never {})
            .boxed_unsync(),
        Body::Stream(stream) => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
    };

    let mut native = Response::new(body);
    *native.status_mut() = status;
    *native.headers_mut() = headers;
    native
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_request_from_http_rebuilds_url_and_streams_body() {
        let native = Request::builder()
            .method(Method::POST)
            .uri("/posts?draft=true")
            .header("host", "localhost:3000")
            .body(Full::new(Bytes::from_static(b"{\"title\":\"x\"}")))
            .unwrap();

        let mut request = request_from_http(native, "http").unwrap();
        assert_eq!(request.uri().to_string(), "http://localhost:3000/posts?draft=true");
        assert!(request.body().is_stream());
        assert_eq!(
            request.take_body().collect_text().await.unwrap(),
            "{\"title\":\"x\"}"
        );
    }

    #[test]
    fn test_request_without_host_keeps_relative_uri() {
        let native = Request::builder()
            .uri("/health")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let request = request_from_http(native, "https").unwrap();
        assert_eq!(request.path(), "/health");
        assert!(request.uri().host().is_none());
    }

    #[tokio::test]
    async fn test_response_to_http_buffered() {
        let response = UniversalResponse::json(StatusCode::CREATED, json!({"id": 3}));
        let native = response_to_http(response);
        assert_eq!(native.status(), StatusCode::CREATED);
        assert_eq!(native.headers()["content-type"], "application/json");

        let bytes = native.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"{\"id\":3}");
    }

    #[tokio::test]
    async fn test_response_to_http_stream() {
        let response = UniversalResponse::stream(
            StatusCode::OK,
            "text/event-stream",
            Body::from_chunks(vec![
                Bytes::from_static(b"data: 1\n\n"),
                Bytes::from_static(b"data: 2\n\n"),
            ]),
        );
        let native = response_to_http(response);
        let bytes = native.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"data: 1\n\ndata: 2\n\n");
    }
}
