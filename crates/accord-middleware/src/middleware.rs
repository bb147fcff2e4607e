//! Core middleware trait and types.
//!
//! Route middleware runs after a request has been validated and before the
//! handler. Each stage receives the validated [`RequestInput`], the
//! [`RequestContext`] and a [`Next`] to continue the chain. A stage that
//! returns without calling `next` short-circuits: its outcome becomes the
//! route's response and the handler never runs.
//!
//! # Example
//!
//! ```
//! use accord_core::{HandlerOutcome, HandlerResponse};
//! use accord_middleware::FnMiddleware;
//!
//! let require_key = FnMiddleware::new("require_key", |input, ctx, next| async move {
//!     if input.header("x-api-key").is_none() {
//!         let denied = HandlerResponse::json(401, serde_json::json!({"message": "Unauthorized"}));
//!         return Ok(HandlerOutcome::ShortCircuit(denied));
//!     }
//!     next.run(input, ctx).await
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use accord_core::{BoxFuture, Handler, HandlerResult, RequestContext, RequestInput};

/// A shareable middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// A stage in a route's middleware chain.
///
/// # Invariants
///
/// - Call `next.run()` at most once
/// - Do not swallow handler errors; pass them on
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        input: RequestInput,
        ctx: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// The middleware stages and handler of one route.
///
/// Built once per route; running it is cheap.
#[derive(Clone)]
pub struct Chain {
    stages: Arc<[BoxedMiddleware]>,
    handler: Arc<dyn Handler>,
}

impl Chain {
    /// Creates a chain that runs `stages` in order, then `handler`.
    pub fn new(stages: Vec<BoxedMiddleware>, handler: Arc<dyn Handler>) -> Self {
        Self {
            stages: stages.into(),
            handler,
        }
    }

    /// Runs the chain.
    pub fn run(&self, input: RequestInput, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        Next {
            chain: self.clone(),
            index: 0,
        }
        .run(input, ctx)
    }

    /// Returns the stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the handler runs directly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

/// The rest of a chain.
///
/// Consumed by [`Next::run`], so it can only be called once.
pub struct Next {
    chain: Chain,
    index: usize,
}

impl Next {
    /// Invokes the next stage, or the handler at the end of the chain.
    pub fn run(self, input: RequestInput, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        let Some(stage) = self.chain.stages.get(self.index).cloned() else {
            return self.chain.handler.call(input, ctx);
        };
        let next = Self {
            chain: self.chain,
            index: self.index + 1,
        };
        Box::pin(async move {
            tracing::trace!(stage = stage.name(), "entering middleware");
            stage.process(input, ctx, next).await
        })
    }
}

/// A middleware built from an async closure.
///
/// ```
/// use accord_middleware::FnMiddleware;
///
/// let timing = FnMiddleware::new("timing", |input, ctx, next| async move {
///     let started = std::time::Instant::now();
///     let outcome = next.run(input, ctx).await;
///     tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "handled");
///     outcome
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a function-based middleware.
    pub fn new<Fut>(name: &'static str, func: F) -> Self
    where
        F: Fn(RequestInput, RequestContext, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self { name, func }
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(RequestInput, RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        input: RequestInput,
        ctx: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin((self.func)(input, ctx, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, echo_handler};
    use accord_core::{HandlerOutcome, HandlerResponse};
    use parking_lot::Mutex;

    struct Recording {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            input: RequestInput,
            ctx: RequestContext,
            next: Next,
        ) -> BoxFuture<'a, HandlerResult> {
            Box::pin(async move {
                self.seen.lock().push(self.name);
                next.run(input, ctx).await
            })
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(
            vec![
                Arc::new(Recording { name: "first", seen: seen.clone() }),
                Arc::new(Recording { name: "second", seen: seen.clone() }),
            ],
            echo_handler(),
        );

        assert_eq!(chain.stage_names(), vec!["first", "second"]);
        let outcome = chain.run(RequestInput::default(), context()).await.unwrap();
        assert_eq!(outcome.response().status, 200);
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let deny = FnMiddleware::new("deny", |_input, _ctx, _next| async move {
            Ok(HandlerOutcome::ShortCircuit(HandlerResponse::new(401)))
        });
        let chain = Chain::new(vec![Arc::new(deny)], echo_handler());
        let outcome = chain.run(RequestInput::default(), context()).await.unwrap();
        assert!(outcome.is_short_circuit());
        assert_eq!(outcome.response().status, 401);
    }

    #[tokio::test]
    async fn test_middleware_can_rewrite_input() {
        let inject = FnMiddleware::new("inject", |mut input: RequestInput, ctx, next| async move {
            input.body = serde_json::json!({"injected": true});
            next.run(input, ctx).await
        });
        let chain = Chain::new(vec![Arc::new(inject)], echo_handler());
        let outcome = chain.run(RequestInput::default(), context()).await.unwrap();
        assert!(matches!(
            &outcome.response().body,
            accord_core::ResponseBody::Json(value) if value["injected"] == true
        ));
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let failing: Arc<dyn Handler> = Arc::new(|_input: RequestInput, _ctx: RequestContext| async move {
            Err::<HandlerResponse, _>(anyhow::anyhow!("boom"))
        });
        let chain = Chain::new(Vec::new(), failing);
        assert!(chain.is_empty());
        let err = chain.run(RequestInput::default(), context()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
