//! Universal request.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Uri};

use crate::{Body, PlatformError, PlatformResult};

/// A platform-agnostic HTTP request.
///
/// Created per inbound call by a platform mapper (or by a test) and owned by
/// the task handling that call.
#[derive(Debug)]
pub struct UniversalRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
}

impl UniversalRequest {
    /// Creates a request from its parts.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Body) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Starts building a request for `url`.
    #[must_use]
    pub fn builder(method: Method, url: impl Into<String>) -> UniversalRequestBuilder {
        UniversalRequestBuilder::new(method, url)
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path component, `/` if empty.
    #[must_use]
    pub fn path(&self) -> &str {
        match self.uri.path() {
            "" => "/",
            path => path,
        }
    }

    /// Returns the raw query string, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
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

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Takes the body, leaving [`Body::Empty`] behind.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Buffers a streaming body so the request can be inspected or cloned.
    pub async fn materialize(mut self) -> PlatformResult<Self> {
        self.body = self.body.materialize().await?;
        Ok(self)
    }

    /// Clones a request whose body is buffered.
    pub fn try_clone(&self) -> PlatformResult<Self> {
        Ok(Self {
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
        })
    }

    /// Splits the request into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Method, Uri, HeaderMap, Body) {
        (self.method, self.uri, self.headers, self.body)
    }
}

/// Builder for [`UniversalRequest`].
///
/// Invalid URLs or headers are reported by [`build`](Self::build) rather
/// than at the call that introduced them.
#[derive(Debug)]
pub struct UniversalRequestBuilder {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Body,
}

impl UniversalRequestBuilder {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Appends a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and its content type.
    pub fn json<T: serde::Serialize>(self, value: &T) -> PlatformResult<Self> {
        let text = serde_json::to_string(value)?;
        Ok(self.header("content-type", "application/json").body(text))
    }

    /// Builds the request.
    pub fn build(self) -> PlatformResult<UniversalRequest> {
        let uri: Uri = self
            .url
            .parse()
            .map_err(|e| PlatformError::invalid_url(&self.url, e))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| PlatformError::invalid_header(name))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| PlatformError::invalid_header(name))?;
            headers.append(header_name, header_value);
        }

        Ok(UniversalRequest::new(self.method, uri, headers, self.body))
    }
}
