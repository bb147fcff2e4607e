//! Fluent construction of a [`Dispatcher`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use accord_core::{flatten, ContractError, ContractResult, Handler, ImplNode, Router};
use accord_middleware::{BoxedMiddleware, Middleware, Pipeline};

use crate::dispatcher::Dispatcher;
use crate::format::ValidationErrorFormat;
use crate::options::DispatchOptions;

/// The implementation of one route: its middleware and handler.
#[derive(Clone)]
pub struct RouteImpl {
    pub(crate) middleware: Vec<BoxedMiddleware>,
    pub(crate) handler: Arc<dyn Handler>,
}

impl RouteImpl {
    /// A handler without route middleware.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self {
            middleware: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// A handler behind `middleware`, which runs in order after the global
    /// stages.
    pub fn with_middleware<H: Handler>(middleware: Vec<BoxedMiddleware>, handler: H) -> Self {
        Self {
            middleware,
            handler: Arc::new(handler),
        }
    }

    /// Appends one middleware.
    #[must_use]
    pub fn layer<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }
}

impl fmt::Debug for RouteImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.middleware.iter().map(|m| m.name()).collect();
        f.debug_struct("RouteImpl")
            .field("middleware", &names)
            .finish_non_exhaustive()
    }
}

/// Builds a [`Dispatcher`] from a contract and its implementations.
///
/// Implementations can be registered one at a time by dotted key path, or
/// as a whole [`ImplNode`] tree. Missing or misplaced implementations are
/// reported by [`ServerBuilder::build`].
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = ServerBuilder::new(contract)
///     .base_path("/api")
///     .json_query(true)
///     .handle("posts.getPost", get_post)
///     .handle("posts.createPost", create_post)
///     .build()?;
/// ```
pub struct ServerBuilder {
    contract: Router,
    implementation: ImplNode<RouteImpl>,
    error: Option<ContractError>,
    options: DispatchOptions,
    pipeline: Pipeline,
}

impl ServerBuilder {
    /// Starts a builder for `contract`.
    #[must_use]
    pub fn new(contract: Router) -> Self {
        Self {
            contract,
            implementation: ImplNode::default(),
            error: None,
            options: DispatchOptions::default(),
            pipeline: Pipeline::default(),
        }
    }

    /// Implements the route at `key_path` (e.g. `posts.getPost`).
    #[must_use]
    pub fn handle<H: Handler>(self, key_path: &str, handler: H) -> Self {
        self.route(key_path, RouteImpl::new(handler))
    }

    /// Implements the route at `key_path` with route middleware.
    #[must_use]
    pub fn handle_with<H: Handler>(self, key_path: &str, middleware: Vec<BoxedMiddleware>, handler: H) -> Self {
        self.route(key_path, RouteImpl::with_middleware(middleware, handler))
    }

    /// Implements the route at `key_path`.
    ///
    /// The first failed registration is kept and returned by `build`.
    #[must_use]
    pub fn route(mut self, key_path: &str, implementation: RouteImpl) -> Self {
        if self.error.is_none() {
            let path: Vec<&str> = key_path.split('.').collect();
            if let Err(error) = self.implementation.insert(&path, implementation) {
                self.error = Some(error);
            }
        }
        self
    }

    /// Replaces all implementations with a tree mirroring the contract.
    #[must_use]
    pub fn implementation(mut self, tree: ImplNode<RouteImpl>) -> Self {
        self.implementation = tree;
        self
    }

    /// Replaces all options.
    #[must_use]
    pub fn options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the prefix applied to every route.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.options.base_path = base_path.into();
        self
    }

    /// Enables JSON query mode.
    #[must_use]
    pub fn json_query(mut self, enabled: bool) -> Self {
        self.options.json_query = enabled;
        self
    }

    /// Enables response validation.
    #[must_use]
    pub fn response_validation(mut self, enabled: bool) -> Self {
        self.options.response_validation = enabled;
        self
    }

    /// Sets how request validation failures are answered.
    #[must_use]
    pub fn validation_error_format(mut self, format: ValidationErrorFormat) -> Self {
        self.options.validation_error_format = format;
        self
    }

    /// Sets the largest accepted request body.
    #[must_use]
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.options.max_body_size = Some(limit);
        self
    }

    /// Sets the time allowed for middleware and handler.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = Some(timeout);
        self
    }

    /// Sets the global stages and hooks.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Resolves implementations against the contract.
    ///
    /// # Errors
    ///
    /// Returns the first registration error, or the error from
    /// [`flatten`](accord_core::flatten) when the implementation does not
    /// mirror the contract.
    pub fn build(self) -> ContractResult<Dispatcher> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let flat = flatten(&self.contract, self.implementation)?;
        tracing::debug!(routes = flat.len(), "contract resolved");
        Dispatcher::new(flat, self.pipeline, self.options)
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("routes", &self.contract.routes().len())
            .field("options", &self.options)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
