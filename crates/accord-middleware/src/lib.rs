//! # Accord Middleware
//!
//! Route middleware and server-wide hooks.
//!
//! ```text
//! validated request -> pre hooks -> global stages -> route stages -> handler
//!                                                                      |
//!                          response pipeline <- post hooks <-----------+
//! ```
//!
//! - [`Middleware`] / [`Next`] / [`FnMiddleware`] - stages around a handler
//! - [`Chain`] - one route's stages and handler, built once
//! - [`Pipeline`] - global stages plus ordered pre/post hooks
//!
//! Any stage or hook may short-circuit with its own response; the response
//! pipeline renders it like any other.

#![doc(html_root_url = "https://docs.rs/accord-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use middleware::{BoxedMiddleware, Chain, FnMiddleware, Middleware, Next};
pub use pipeline::{HookError, Pipeline, PipelineBuilder, PostHandlerHook, PreHandlerHook};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use accord_core::{
        Handler, HandlerResponse, RequestContext, RequestHead, RequestInput, Route,
    };
    use accord_router::Params;
    use http::{HeaderMap, Uri};

    pub(crate) fn context_with_headers(headers: HeaderMap) -> RequestContext {
        let route = Route::get("/test").build().unwrap();
        let head = RequestHead::new(http::Method::GET, Uri::from_static("http://localhost/test"), headers);
        RequestContext::new(Arc::new(route), Arc::from(vec!["test".to_string()]), head, Params::new())
    }

    pub(crate) fn context() -> RequestContext {
        context_with_headers(HeaderMap::new())
    }

    pub(crate) fn echo_handler() -> Arc<dyn Handler> {
        Arc::new(|input: RequestInput, _ctx: RequestContext| async move {
            Ok::<_, anyhow::Error>(HandlerResponse::json(200, input.body))
        })
    }
}
