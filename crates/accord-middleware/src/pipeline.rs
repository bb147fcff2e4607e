//! Global stages and hooks around every route.
//!
//! A [`Pipeline`] holds what applies to all routes of a server:
//!
//! 1. pre-handler hooks, in registration order, which may reject a request
//! 2. global middleware stages, then the route's own stages
//! 3. the handler
//! 4. post-handler hooks, in registration order, which see the response
//!
//! A hook failure short-circuits with the hook's status and message.

use std::sync::Arc;

use accord_core::{
    BoxFuture, Handler, HandlerOutcome, HandlerResponse, HandlerResult, RequestContext,
    RequestInput,
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::{BoxedMiddleware, Chain, Middleware};

/// A hook that runs before any middleware.
pub type PreHandlerHook = Arc<
    dyn Fn(&RequestContext, &RequestInput) -> BoxFuture<'static, Result<(), HookError>>
        + Send
        + Sync
        + 'static,
>;

/// A hook that runs after the handler.
pub type PostHandlerHook = Arc<
    dyn Fn(&RequestContext, &HandlerResponse) -> BoxFuture<'static, Result<(), HookError>>
        + Send
        + Sync
        + 'static,
>;

/// A hook's refusal, answered with `status` and a `{"message"}` body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hook error ({status}): {message}")]
pub struct HookError {
    /// Response status.
    pub status: u16,
    /// Message for the client.
    pub message: String,
}

impl HookError {
    /// Creates a hook error.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A 401 refusal.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    /// A 403 refusal.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    /// Converts into the short-circuit response.
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        HandlerResponse::json(self.status, json!({ "message": self.message }))
    }
}

/// Stages and hooks shared by all routes.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    pre_handler_hooks: Vec<PreHandlerHook>,
    post_handler_hooks: Vec<PostHandlerHook>,
}

impl Pipeline {
    /// Creates a pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Builds the chain for one route: global stages, then `route_stages`,
    /// then `handler`.
    pub fn chain(&self, route_stages: Vec<BoxedMiddleware>, handler: Arc<dyn Handler>) -> Chain {
        let stages = self.stages.iter().cloned().chain(route_stages).collect();
        Chain::new(stages, handler)
    }

    /// Runs hooks around `chain`.
    ///
    /// # Errors
    ///
    /// Returns handler errors unchanged.
    pub async fn process(&self, chain: &Chain, input: RequestInput, ctx: RequestContext) -> HandlerResult {
        for hook in &self.pre_handler_hooks {
            if let Err(error) = hook(&ctx, &input).await {
                tracing::debug!(status = error.status, message = %error.message, "pre-handler hook rejected request");
                return Ok(HandlerOutcome::ShortCircuit(error.into_response()));
            }
        }

        let outcome = chain.run(input, ctx.clone()).await?;

        for hook in &self.post_handler_hooks {
            if let Err(error) = hook(&ctx, outcome.response()).await {
                tracing::debug!(status = error.status, message = %error.message, "post-handler hook replaced response");
                return Ok(HandlerOutcome::ShortCircuit(error.into_response()));
            }
        }
        Ok(outcome)
    }

    /// Returns the global stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of hooks, pre and post.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.pre_handler_hooks.len() + self.post_handler_hooks.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("pre_handler_hooks", &self.pre_handler_hooks.len())
            .field("post_handler_hooks", &self.post_handler_hooks.len())
            .finish()
    }
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a global middleware stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.pipeline.stages.push(Arc::new(middleware));
        self
    }

    /// Appends a shared global middleware stage.
    #[must_use]
    pub fn boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.pipeline.stages.push(middleware);
        self
    }

    /// Appends a pre-handler hook.
    #[must_use]
    pub fn pre_handler<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext, &RequestInput) -> BoxFuture<'static, Result<(), HookError>>
            + Send
            + Sync
            + 'static,
    {
        self.pipeline.pre_handler_hooks.push(Arc::new(hook));
        self
    }

    /// Appends a post-handler hook.
    #[must_use]
    pub fn post_handler<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext, &HandlerResponse) -> BoxFuture<'static, Result<(), HookError>>
            + Send
            + Sync
            + 'static,
    {
        self.pipeline.post_handler_hooks.push(Arc::new(hook));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}
