//! Per-request context.
//!
//! [`RequestContext`] travels through middleware into the handler. It names
//! the matched route, exposes the raw request head and buffered body, and
//! collects headers that should be added to whatever response is finally
//! produced.

use std::fmt;
use std::sync::Arc;

use accord_router::Params;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{Extensions, HeaderMap, Method, Uri};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::Route;

/// A unique identifier for each request, using UUID v7.
///
/// ```
/// use accord_core::RequestId;
///
/// let a = RequestId::new();
/// let b = RequestId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Method, URI and headers of the inbound request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Method.
    pub method: Method,
    /// Full URI.
    pub uri: Uri,
    /// Headers as received.
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Creates a head from its parts.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }
}

struct Inner {
    request_id: RequestId,
    route: Arc<Route>,
    key_path: Arc<[String]>,
    head: RequestHead,
    raw_params: Params,
    raw_body: Mutex<Option<Bytes>>,
    response_headers: Mutex<HeaderMap>,
    extensions: Mutex<Extensions>,
}

/// Per-request state shared by middleware and the handler.
///
/// Cloning is cheap; clones share response headers and extensions.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

impl RequestContext {
    /// Creates a context for a matched route.
    #[must_use]
    pub fn new(route: Arc<Route>, key_path: Arc<[String]>, head: RequestHead, raw_params: Params) -> Self {
        Self {
            inner: Arc::new(Inner {
                request_id: RequestId::new(),
                route,
                key_path,
                head,
                raw_params,
                raw_body: Mutex::new(None),
                response_headers: Mutex::new(HeaderMap::new()),
                extensions: Mutex::new(Extensions::new()),
            }),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.inner.request_id
    }

    /// Returns the matched route.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.inner.route
    }

    /// Returns the route's key path, e.g. `["posts", "getPost"]`.
    #[must_use]
    pub fn key_path(&self) -> &[String] {
        &self.inner.key_path
    }

    /// Returns the key path joined with dots.
    #[must_use]
    pub fn route_name(&self) -> String {
        self.inner.key_path.join(".")
    }

    /// Returns the request head.
    #[must_use]
    pub fn head(&self) -> &RequestHead {
        &self.inner.head
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.head.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.inner.head.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub fn request_headers(&self) -> &HeaderMap {
        &self.inner.head.headers
    }

    /// Returns the path parameters as matched, before validation.
    #[must_use]
    pub fn raw_params(&self) -> &Params {
        &self.inner.raw_params
    }

    /// Returns the request body bytes, once they have been read.
    #[must_use]
    pub fn raw_body(&self) -> Option<Bytes> {
        self.inner.raw_body.lock().clone()
    }

    /// Records the request body bytes.
    pub fn set_raw_body(&self, body: Bytes) {
        *self.inner.raw_body.lock() = Some(body);
    }

    /// Sets a response header, replacing earlier values.
    pub fn set_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.response_headers.lock().insert(name, value);
    }

    /// Appends a response header.
    pub fn append_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner.response_headers.lock().append(name, value);
    }

    /// Returns a copy of the pending response headers.
    #[must_use]
    pub fn response_headers(&self) -> HeaderMap {
        self.inner.response_headers.lock().clone()
    }

    /// Takes the pending response headers, leaving none behind.
    #[must_use]
    pub fn take_response_headers(&self) -> HeaderMap {
        std::mem::take(&mut *self.inner.response_headers.lock())
    }

    /// Stores a typed value for later middleware or the handler.
    pub fn insert_extension<T: Clone + Send + Sync + 'static>(&self, value: T) -> Option<T> {
        self.inner.extensions.lock().insert(value)
    }

    /// Returns a stored typed value.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.inner.extensions.lock().get::<T>().cloned()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.inner.request_id)
            .field("route", &self.route_name())
            .field("method", &self.inner.head.method)
            .field("uri", &self.inner.head.uri)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn context_for(route: crate::contract::RouteBuilder) -> RequestContext {
        let route = route.build().unwrap();
        let head = RequestHead::new(
            route.method().clone(),
            Uri::from_static("http://localhost/"),
            HeaderMap::new(),
        );
        RequestContext::new(Arc::new(route), Arc::from(vec!["test".to_string()]), head, Params::new())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::context_for;
    use super::*;
    use crate::contract::Route;

    #[test]
    fn test_clones_share_response_headers() {
        let ctx = context_for(Route::get("/posts"));
        let clone = ctx.clone();
        clone.set_response_header(
            HeaderName::from_static("x-total-count"),
            HeaderValue::from_static("3"),
        );
        assert_eq!(ctx.response_headers()["x-total-count"], "3");

        let taken = ctx.take_response_headers();
        assert_eq!(taken.len(), 1);
        assert!(clone.response_headers().is_empty());
    }

    #[test]
    fn test_extensions() {
        #[derive(Clone, Debug, PartialEq)]
        struct UserId(u64);

        let ctx = context_for(Route::get("/me"));
        assert!(ctx.extension::<UserId>().is_none());
        ctx.insert_extension(UserId(7));
        assert_eq!(ctx.clone().extension::<UserId>(), Some(UserId(7)));
    }

    #[test]
    fn test_route_and_raw_body() {
        let ctx = context_for(Route::post("/upload"));
        assert_eq!(ctx.route().path(), "/upload");
        assert_eq!(ctx.route_name(), "test");
        assert!(ctx.raw_body().is_none());
        ctx.set_raw_body(Bytes::from_static(b"abc"));
        assert_eq!(ctx.raw_body().unwrap().as_ref(), b"abc");
    }
}
