//! Handler contract.
//!
//! A handler receives the validated request as a [`RequestInput`] plus a
//! [`RequestContext`], and returns a [`HandlerOutcome`]. Any async function
//! or closure of that shape is a [`Handler`]:
//!
//! ```
//! use accord_core::{HandlerResponse, RequestContext, RequestInput};
//! use serde_json::json;
//!
//! async fn get_post(input: RequestInput, _ctx: RequestContext) -> anyhow::Result<HandlerResponse> {
//!     let id = input.param("id").unwrap_or_default().to_string();
//!     Ok(HandlerResponse::json(200, json!({"id": id, "title": "Hello"})))
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use accord_platform::BodyStream;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler returns.
pub type HandlerResult = Result<HandlerOutcome, anyhow::Error>;

/// The validated request, one JSON value per facet.
///
/// Facets without a schema hold the raw decoded value: path parameters and
/// headers as string maps, the query per the server's query mode, and the
/// body decoded by content type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInput {
    /// Path parameters.
    pub params: Value,
    /// Query parameters.
    pub query: Value,
    /// Headers.
    pub headers: Value,
    /// Body.
    pub body: Value,
}

impl RequestInput {
    /// Returns a path parameter as a string, if it is one.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Returns a header as a string, if it is one. Names are lowercase.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(Value::as_str)
    }

    /// Deserializes the path parameters.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.params)
    }

    /// Deserializes the query.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.query)
    }

    /// Deserializes the headers.
    pub fn headers_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.headers)
    }

    /// Deserializes the body.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// The body of a [`HandlerResponse`].
#[derive(Default)]
pub enum ResponseBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON value.
    Json(Value),
    /// Text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// A stream of chunks, forwarded as produced.
    Stream(BodyStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A status, extra headers and a body.
#[derive(Debug)]
pub struct HandlerResponse {
    /// Numeric status. Statuses the contract does not declare are allowed.
    pub status: u16,
    /// Headers added to the response.
    pub headers: HeaderMap,
    /// The body.
    pub body: ResponseBody,
}

impl HandlerResponse {
    /// A response without a body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    /// A JSON response.
    #[must_use]
    pub fn json(status: u16, value: Value) -> Self {
        Self::new(status).with_body(ResponseBody::Json(value))
    }

    /// A JSON response serialized from `value`.
    pub fn json_from<T: Serialize>(status: u16, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::json(status, serde_json::to_value(value)?))
    }

    /// A text response.
    #[must_use]
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self::new(status).with_body(ResponseBody::Text(text.into()))
    }

    /// A binary response.
    #[must_use]
    pub fn bytes(status: u16, bytes: impl Into<Bytes>) -> Self {
        Self::new(status).with_body(ResponseBody::Bytes(bytes.into()))
    }

    /// A streaming response.
    #[must_use]
    pub fn stream(status: u16, stream: BodyStream) -> Self {
        Self::new(status).with_body(ResponseBody::Stream(stream))
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// How a handler finished.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// The normal response, subject to response validation.
    Respond(HandlerResponse),
    /// An early response from a handler or route middleware. Rendered
    /// exactly like [`HandlerOutcome::Respond`].
    ShortCircuit(HandlerResponse),
}

impl HandlerOutcome {
    /// Returns the response.
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        match self {
            Self::Respond(response) | Self::ShortCircuit(response) => response,
        }
    }

    /// Borrows the response.
    #[must_use]
    pub fn response(&self) -> &HandlerResponse {
        match self {
            Self::Respond(response) | Self::ShortCircuit(response) => response,
        }
    }

    /// Returns true for [`HandlerOutcome::ShortCircuit`].
    #[must_use]
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Self::ShortCircuit(_))
    }
}

impl From<HandlerResponse> for HandlerOutcome {
    fn from(response: HandlerResponse) -> Self {
        Self::Respond(response)
    }
}

/// Something that handles validated requests for one route.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, input: RequestInput, ctx: RequestContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut, O> Handler for F
where
    F: Fn(RequestInput, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, anyhow::Error>> + Send + 'static,
    O: Into<HandlerOutcome>,
{
    fn call(&self, input: RequestInput, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        let fut = (self)(input, ctx);
        Box::pin(async move { fut.await.map(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct ListQuery {
        take: u32,
    }

    #[test]
    fn test_input_accessors() {
        let input = RequestInput {
            params: json!({"id": "7"}),
            query: json!({"take": 10}),
            headers: json!({"x-api-key": "k"}),
            body: Value::Null,
        };
        assert_eq!(input.param("id"), Some("7"));
        assert_eq!(input.header("x-api-key"), Some("k"));
        assert_eq!(input.query_as::<ListQuery>().unwrap().take, 10);
        assert!(input.body_as::<ListQuery>().is_err());
    }

    #[test]
    fn test_response_constructors() {
        let response = HandlerResponse::json(201, json!({"id": 1}))
            .with_header(http::header::LOCATION, HeaderValue::from_static("/posts/1"));
        assert_eq!(response.status, 201);
        assert_eq!(response.headers["location"], "/posts/1");
        assert!(matches!(response.body, ResponseBody::Json(_)));

        assert!(matches!(HandlerResponse::new(204).body, ResponseBody::Empty));
        assert!(matches!(
            HandlerResponse::text(200, "hi").body,
            ResponseBody::Text(ref t) if t == "hi"
        ));
    }

    #[test]
    fn test_outcome_conversion() {
        let outcome: HandlerOutcome = HandlerResponse::new(200).into();
        assert!(!outcome.is_short_circuit());
        let outcome = HandlerOutcome::ShortCircuit(HandlerResponse::new(401));
        assert!(outcome.is_short_circuit());
        assert_eq!(outcome.into_response().status, 401);
    }
}
