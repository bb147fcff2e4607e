//! Request dispatch.
//!
//! A [`Dispatcher`] owns the flattened route table and runs every request
//! through the same steps:
//!
//! 1. match the method and path (or take the route a framework matched)
//! 2. validate the four request facets
//! 3. run global stages, route middleware and the handler
//! 4. render the outcome through the response pipeline
//!
//! The table is built once and shared read-only; clones of a dispatcher are
//! cheap and can serve requests concurrently.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use accord_core::{
    ContractError, ContractResult, FlatRoute, RequestContext, RequestHead, Route,
};
use accord_extract::{validate_request, ExtractError, RequestParts, ValidationOptions};
use accord_middleware::{Chain, Pipeline};
use accord_platform::mappers::api_gateway::{into_gateway_response, ApiGatewayEvent, ApiGatewayResponse};
use accord_platform::mappers::native::{request_from_http, response_to_http, NativeBody};
use accord_platform::{UniversalRequest, UniversalResponse};
use accord_router::{join_paths, Params, PathTemplate, RouteTable};
use accord_telemetry::metrics;
use bytes::Bytes;
use http::{Method, Request, Response};
use tracing::Instrument;

use crate::builder::RouteImpl;
use crate::error::{DispatchError, DispatchResult};
use crate::options::DispatchOptions;
use crate::response::{internal_error, not_found, render, timed_out};

struct CompiledRoute {
    route: Arc<Route>,
    key_path: Arc<[String]>,
    name: String,
    chain: Chain,
}

struct Inner {
    table: RouteTable<usize>,
    routes: Vec<CompiledRoute>,
    pipeline: Pipeline,
    options: DispatchOptions,
    validation: ValidationOptions,
}

/// A registered route, as seen by framework bindings.
#[derive(Debug, Clone, Copy)]
pub struct RouteInfo<'a> {
    /// Index to pass to [`Dispatcher::dispatch_route`].
    pub index: usize,
    /// HTTP method.
    pub method: &'a Method,
    /// Full path template, base path included.
    pub path: &'a str,
    /// Dotted key path.
    pub name: &'a str,
    /// The contract route.
    pub route: &'a Route,
}

/// Validates and dispatches requests for one contract.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub(crate) fn new(
        flat: Vec<FlatRoute<RouteImpl>>,
        pipeline: Pipeline,
        options: DispatchOptions,
    ) -> ContractResult<Self> {
        let mut table = RouteTable::new();
        let mut routes = Vec::with_capacity(flat.len());

        for entry in flat {
            let name = entry.name();
            let template = if options.base_path.is_empty() {
                entry.route.template().clone()
            } else {
                let path = join_paths(&options.base_path, entry.route.path());
                PathTemplate::parse(&path)
                    .map_err(|source| ContractError::InvalidPath { path, source })?
            };

            let RouteImpl {
                middleware,
                handler,
            } = entry.implementation;

            let index = table.insert(entry.route.method().clone(), template, routes.len());
            tracing::debug!(
                route = %name,
                method = %entry.route.method(),
                path = %table.get(index).map_or("", |e| e.template.as_str()),
                middleware = middleware.len(),
                "registered route"
            );

            routes.push(CompiledRoute {
                chain: pipeline.chain(middleware, handler),
                route: Arc::new(entry.route),
                key_path: entry.key_path.into(),
                name,
            });
        }

        let validation = options.validation_options();
        Ok(Self {
            inner: Arc::new(Inner {
                table,
                routes,
                pipeline,
                options,
                validation,
            }),
        })
    }

    /// Lists registered routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = RouteInfo<'_>> {
        self.inner
            .table
            .iter()
            .filter_map(move |entry| {
                let compiled = self.inner.routes.get(entry.value)?;
                Some(RouteInfo {
                    index: entry.value,
                    method: &entry.method,
                    path: entry.template.as_str(),
                    name: &compiled.name,
                    route: &compiled.route,
                })
            })
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.routes.len()
    }

    /// Returns true if the contract has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.routes.is_empty()
    }

    /// Returns the options in effect.
    #[must_use]
    pub fn options(&self) -> &DispatchOptions {
        &self.inner.options
    }

    /// Finds the route for `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<(usize, Params)> {
        self.inner
            .table
            .match_route(method, path)
            .map(|matched| (*matched.value, matched.params))
    }

    /// Matches and dispatches a request.
    ///
    /// Requests that match no route are answered with
    /// `404 {"message": "Not found"}`.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch_route`].
    pub async fn dispatch(&self, request: UniversalRequest) -> DispatchResult<UniversalResponse> {
        match self.match_route(request.method(), request.path()) {
            Some((index, params)) => self.dispatch_route(index, params, request).await,
            None => {
                tracing::debug!(method = %request.method(), path = request.path(), "no route matched");
                metrics::record_unmatched(request.method().as_str());
                Ok(not_found())
            }
        }
    }

    /// Dispatches a request a framework has already matched to route
    /// `index`, with the path parameters it extracted.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UnknownRoute`] for an index this dispatcher lacks
    /// - [`DispatchError::Platform`] when the body stream fails
    /// - [`DispatchError::Handler`] when the handler or a middleware fails
    pub async fn dispatch_route(
        &self,
        index: usize,
        params: Params,
        request: UniversalRequest,
    ) -> DispatchResult<UniversalResponse> {
        let compiled = self
            .inner
            .routes
            .get(index)
            .ok_or(DispatchError::UnknownRoute { index })?;

        let span = tracing::debug_span!(
            "dispatch",
            route = %compiled.name,
            method = %request.method(),
            path = request.path(),
        );
        let head = request.method() == Method::HEAD;
        let mut response = self.run(compiled, params, request).instrument(span).await?;
        if head {
            response.strip_body();
        }
        Ok(response)
    }

    async fn run(
        &self,
        compiled: &CompiledRoute,
        params: Params,
        request: UniversalRequest,
    ) -> DispatchResult<UniversalResponse> {
        let started = Instant::now();
        let (method, uri, headers, body) = request.into_parts();
        let ctx = RequestContext::new(
            Arc::clone(&compiled.route),
            Arc::clone(&compiled.key_path),
            RequestHead::new(method, uri, headers),
            params,
        );

        let parts = RequestParts {
            params: ctx.raw_params(),
            headers: ctx.request_headers(),
            query: ctx.uri().query(),
            body,
        };

        let validated = match validate_request(&compiled.route, parts, &self.inner.validation).await {
            Ok(validated) => validated,
            Err(ExtractError::Invalid(error)) => {
                let facets: Vec<&str> = error
                    .failing_facets()
                    .into_iter()
                    .map(|facet| facet.error_key())
                    .collect();
                tracing::warn!(
                    route = %compiled.name,
                    request_id = %ctx.request_id(),
                    facets = ?facets,
                    issues = error.issue_count(),
                    "request validation failed"
                );
                metrics::record_request_validation_failure(&compiled.name, facets);

                let response = self.inner.options.validation_error_format.render(&error, &ctx);
                metrics::record_request(&compiled.name, response.status().as_u16(), started.elapsed());
                return Ok(response);
            }
            Err(ExtractError::BodyRead(error)) => return Err(DispatchError::Platform(error)),
        };

        ctx.set_raw_body(validated.raw_body);
        if !validated.files.is_empty() {
            ctx.insert_extension(validated.files);
        }

        let processed = self
            .inner
            .pipeline
            .process(&compiled.chain, validated.input, ctx.clone());
        let result = match self.inner.options.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, processed).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(route = %compiled.name, timeout = ?limit, "handler execution timed out");
                    let response = timed_out();
                    metrics::record_request(&compiled.name, response.status().as_u16(), started.elapsed());
                    return Ok(response);
                }
            },
            None => processed.await,
        };

        let outcome = result.map_err(|source| DispatchError::handler(compiled.name.clone(), source))?;
        let short_circuit = outcome.is_short_circuit();

        let response = match render(
            &compiled.route,
            outcome,
            ctx.take_response_headers(),
            self.inner.options.response_validation,
        )
        .await
        {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(
                    route = %compiled.name,
                    request_id = %ctx.request_id(),
                    status = error.status,
                    error = %error,
                    "response validation failed"
                );
                metrics::record_response_validation_failure(&compiled.name, error.status);
                internal_error()
            }
        };

        tracing::debug!(
            status = response.status().as_u16(),
            short_circuit,
            duration_ms = started.elapsed().as_millis(),
            "dispatched"
        );
        metrics::record_request(&compiled.name, response.status().as_u16(), started.elapsed());
        Ok(response)
    }

    /// Dispatches a native `http` request, e.g. from a hyper service or a
    /// cloud-function runtime.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Platform`] when the request target cannot be made
    /// absolute, otherwise as [`Dispatcher::dispatch`].
    pub async fn dispatch_http<B>(&self, request: Request<B>) -> DispatchResult<Response<NativeBody>>
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request = request_from_http(request, "http")?;
        let response = self.dispatch(request).await?;
        Ok(response_to_http(response))
    }

    /// Dispatches an API gateway event and answers in the event's payload
    /// format.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Platform`] for malformed events or an unreadable
    /// response stream, otherwise as [`Dispatcher::dispatch`].
    pub async fn dispatch_gateway(&self, event: ApiGatewayEvent) -> DispatchResult<ApiGatewayResponse> {
        let version = event.version();
        let request = event.into_request()?;
        let response = self.dispatch(request).await?;
        Ok(into_gateway_response(version, response).await?)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.inner.routes.len())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}
