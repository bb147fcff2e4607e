//! Request ID stage.
//!
//! Echoes a request ID to the client in `x-request-id`, so callers can
//! correlate responses with server logs.
//!
//! ## Request ID Sources
//!
//! 1. **`x-request-id` header**: used when the stage trusts incoming IDs and
//!    the value is a UUID
//! 2. **The context's ID**: the UUID v7 generated for every request
//!
//! The chosen ID is also stored as a [`RequestId`] context extension.

use accord_core::{BoxFuture, HandlerResult, RequestContext, RequestId, RequestInput};
use http::header::{HeaderName, HeaderValue};
use uuid::Uuid;

use crate::middleware::{Middleware, Next};

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that propagates request IDs.
///
/// ```
/// use accord_middleware::{stages::RequestIdMiddleware, Pipeline};
///
/// let pipeline = Pipeline::builder()
///     .stage(RequestIdMiddleware::trust_incoming())
///     .build();
/// assert_eq!(pipeline.stage_names(), vec!["request_id"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    /// Whether incoming `x-request-id` headers are reused.
    ///
    /// Typically `false` for external traffic and `true` behind a trusted
    /// gateway.
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a stage that always uses the context's ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stage that reuses valid incoming IDs.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn incoming(&self, ctx: &RequestContext) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        ctx.request_headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        input: RequestInput,
        ctx: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let request_id = self.incoming(&ctx).unwrap_or_else(|| ctx.request_id());
            ctx.insert_extension(request_id);
            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                ctx.set_response_header(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            next.run(input, ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_with_headers, echo_handler};
    use crate::Chain;
    use http::HeaderMap;
    use std::sync::Arc;

    async fn run(middleware: RequestIdMiddleware, headers: HeaderMap) -> RequestContext {
        let ctx = context_with_headers(headers);
        let chain = Chain::new(vec![Arc::new(middleware)], echo_handler());
        chain.run(RequestInput::default(), ctx.clone()).await.unwrap();
        ctx
    }

    fn with_id(id: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(id));
        headers
    }

    #[tokio::test]
    async fn test_uses_context_id() {
        let ctx = run(RequestIdMiddleware::new(), HeaderMap::new()).await;
        assert_eq!(
            ctx.response_headers()[REQUEST_ID_HEADER],
            ctx.request_id().to_string()
        );
        assert_eq!(ctx.extension::<RequestId>(), Some(ctx.request_id()));
    }

    #[tokio::test]
    async fn test_ignores_incoming_id_when_not_trusted() {
        let incoming = "01234567-89ab-7def-8123-456789abcdef";
        let ctx = run(RequestIdMiddleware::new(), with_id(incoming)).await;
        assert_ne!(ctx.response_headers()[REQUEST_ID_HEADER], incoming);
    }

    #[tokio::test]
    async fn test_uses_incoming_id_when_trusted() {
        let incoming = "01234567-89ab-7def-8123-456789abcdef";
        let ctx = run(RequestIdMiddleware::trust_incoming(), with_id(incoming)).await;
        assert_eq!(ctx.response_headers()[REQUEST_ID_HEADER], incoming);
        assert_eq!(
            ctx.extension::<RequestId>().map(|id| id.to_string()),
            Some(incoming.to_string())
        );
    }

    #[tokio::test]
    async fn test_ignores_invalid_incoming_id() {
        let ctx = run(RequestIdMiddleware::trust_incoming(), with_id("not-a-uuid")).await;
        let header = ctx.response_headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&header).is_ok());
    }
}
