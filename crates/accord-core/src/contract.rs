//! Contract definitions.
//!
//! A contract is a tree: a [`Router`] maps names to [`RouterNode`]s, each
//! either a [`Route`] (one endpoint) or a nested router. Both the server and
//! the client are driven from the same tree, so a route's schemas, status
//! codes and content type mean the same thing on either side.
//!
//! # Example
//!
//! ```
//! use accord_core::{ResponseSpec, Route, Router, Schema};
//!
//! let post = Schema::object([("id", Schema::string()), ("title", Schema::string())]);
//!
//! let contract = Router::builder()
//!     .path_prefix("/api")
//!     .route(
//!         "getPost",
//!         Route::get("/posts/:id")
//!             .path_params(Schema::object([("id", Schema::string())]))
//!             .response(200, ResponseSpec::json(post))
//!             .response(404, ResponseSpec::no_body()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let route = contract.route(&["getPost"]).unwrap();
//! assert_eq!(route.path(), "/api/posts/:id");
//! assert!(route.is_declared(404));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use accord_router::{join_paths, PathTemplate};
use http::{Method, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ContractError, ContractResult};
use crate::validator::{IntoSchemaRef, SchemaRef};

/// Content type of multipart form bodies.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// What a route accepts as its request body.
#[derive(Debug, Clone, Default)]
pub enum BodySpec {
    /// Any body is accepted and passed through unvalidated.
    #[default]
    Unchecked,
    /// The body must satisfy the schema.
    Schema(SchemaRef),
    /// The route takes no body; whatever is sent is ignored.
    NoBody,
}

impl BodySpec {
    /// Returns the schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&SchemaRef> {
        match self {
            Self::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

/// The declared shape of one response status.
#[derive(Debug, Clone)]
pub enum ResponseSpec {
    /// A JSON body, validated when a schema is given.
    Json(Option<SchemaRef>),
    /// No body at all. Content headers are dropped.
    NoBody,
    /// A non-JSON body written with its declared content type.
    Other {
        /// The declared content type.
        content_type: String,
        /// Optional schema for the raw value.
        schema: Option<SchemaRef>,
    },
}

impl ResponseSpec {
    /// A JSON response validated by `schema`.
    pub fn json(schema: impl IntoSchemaRef) -> Self {
        Self::Json(Some(schema.into_schema_ref()))
    }

    /// A JSON response without validation.
    #[must_use]
    pub fn json_unchecked() -> Self {
        Self::Json(None)
    }

    /// A response without a body.
    #[must_use]
    pub fn no_body() -> Self {
        Self::NoBody
    }

    /// A non-JSON response with the given content type.
    pub fn other(content_type: impl Into<String>) -> Self {
        Self::Other {
            content_type: content_type.into(),
            schema: None,
        }
    }

    /// A non-JSON response whose raw value is validated by `schema`.
    pub fn other_with_schema(content_type: impl Into<String>, schema: impl IntoSchemaRef) -> Self {
        Self::Other {
            content_type: content_type.into(),
            schema: Some(schema.into_schema_ref()),
        }
    }

    /// Returns the schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&SchemaRef> {
        match self {
            Self::Json(schema) | Self::Other { schema, .. } => schema.as_ref(),
            Self::NoBody => None,
        }
    }

    /// Returns true for [`ResponseSpec::NoBody`].
    #[must_use]
    pub fn is_no_body(&self) -> bool {
        matches!(self, Self::NoBody)
    }
}

/// One endpoint of a contract.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    template: PathTemplate,
    path_params: Option<SchemaRef>,
    query: Option<SchemaRef>,
    headers: Option<SchemaRef>,
    body: BodySpec,
    responses: BTreeMap<StatusCode, ResponseSpec>,
    content_type: Option<String>,
    strict_status_codes: Option<bool>,
    summary: Option<String>,
    description: Option<String>,
    deprecated: bool,
    metadata: Option<Value>,
}

impl Route {
    /// Starts a route with an arbitrary method.
    pub fn builder(method: Method, path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(method, path.into())
    }

    /// Starts a `GET` route.
    pub fn get(path: impl Into<String>) -> RouteBuilder {
        Self::builder(Method::GET, path)
    }

    /// Starts a `POST` route.
    pub fn post(path: impl Into<String>) -> RouteBuilder {
        Self::builder(Method::POST, path)
    }

    /// Starts a `PUT` route.
    pub fn put(path: impl Into<String>) -> RouteBuilder {
        Self::builder(Method::PUT, path)
    }

    /// Starts a `PATCH` route.
    pub fn patch(path: impl Into<String>) -> RouteBuilder {
        Self::builder(Method::PATCH, path)
    }

    /// Starts a `DELETE` route.
    pub fn delete(path: impl Into<String>) -> RouteBuilder {
        Self::builder(Method::DELETE, path)
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full path template, prefixes included.
    #[must_use]
    pub fn path(&self) -> &str {
        self.template.as_str()
    }

    /// Returns the parsed path template.
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Returns the path parameter schema.
    #[must_use]
    pub fn path_params_schema(&self) -> Option<&SchemaRef> {
        self.path_params.as_ref()
    }

    /// Returns the query schema.
    #[must_use]
    pub fn query_schema(&self) -> Option<&SchemaRef> {
        self.query.as_ref()
    }

    /// Returns the header schema.
    #[must_use]
    pub fn headers_schema(&self) -> Option<&SchemaRef> {
        self.headers.as_ref()
    }

    /// Returns the body specification.
    #[must_use]
    pub fn body(&self) -> &BodySpec {
        &self.body
    }

    /// Returns every declared response, ordered by status.
    #[must_use]
    pub fn responses(&self) -> &BTreeMap<StatusCode, ResponseSpec> {
        &self.responses
    }

    /// Returns the declared response for `status`.
    #[must_use]
    pub fn response(&self, status: u16) -> Option<&ResponseSpec> {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|status| self.responses.get(&status))
    }

    /// Returns true if `status` is declared.
    #[must_use]
    pub fn is_declared(&self, status: u16) -> bool {
        self.response(status).is_some()
    }

    /// Returns the request content type, if the route declares one.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns true if the request body is sent as a multipart form.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with(MULTIPART_FORM_DATA))
    }

    /// Returns whether only declared statuses are acceptable.
    #[must_use]
    pub fn strict_status_codes(&self) -> bool {
        self.strict_status_codes.unwrap_or(false)
    }

    /// Returns the summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns true if the route is deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Returns free-form metadata attached to the route.
    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    fn apply_prefix(&mut self, prefix: &str) -> ContractResult<()> {
        let path = join_paths(prefix, self.template.as_str());
        self.template = parse_template(&path)?;
        Ok(())
    }

    fn inherit(&mut self, common: &BTreeMap<StatusCode, ResponseSpec>, strict: Option<bool>) {
        for (status, spec) in common {
            self.responses
                .entry(*status)
                .or_insert_with(|| spec.clone());
        }
        if self.strict_status_codes.is_none() {
            self.strict_status_codes = strict;
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

fn parse_template(path: &str) -> ContractResult<PathTemplate> {
    PathTemplate::parse(path).map_err(|source| ContractError::InvalidPath {
        path: path.to_string(),
        source,
    })
}

fn check_status(path: &str, status: u16) -> ContractResult<StatusCode> {
    if !(100..=599).contains(&status) {
        return Err(ContractError::InvalidStatus {
            path: path.to_string(),
            status,
        });
    }
    StatusCode::from_u16(status).map_err(|_| ContractError::InvalidStatus {
        path: path.to_string(),
        status,
    })
}

/// Builder for [`Route`].
///
/// Problems such as a malformed path are reported when the enclosing
/// [`RouterBuilder`] (or [`RouteBuilder::build`]) runs.
#[derive(Debug, Clone)]
#[must_use]
pub struct RouteBuilder {
    method: Method,
    path: String,
    path_params: Option<SchemaRef>,
    query: Option<SchemaRef>,
    headers: Option<SchemaRef>,
    body: BodySpec,
    responses: Vec<(u16, ResponseSpec)>,
    content_type: Option<String>,
    strict_status_codes: Option<bool>,
    summary: Option<String>,
    description: Option<String>,
    deprecated: bool,
    metadata: Option<Value>,
}

impl RouteBuilder {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            path_params: None,
            query: None,
            headers: None,
            body: BodySpec::Unchecked,
            responses: Vec::new(),
            content_type: None,
            strict_status_codes: None,
            summary: None,
            description: None,
            deprecated: false,
            metadata: None,
        }
    }

    /// Sets the path parameter schema.
    pub fn path_params(mut self, schema: impl IntoSchemaRef) -> Self {
        self.path_params = Some(schema.into_schema_ref());
        self
    }

    /// Sets the query schema.
    pub fn query(mut self, schema: impl IntoSchemaRef) -> Self {
        self.query = Some(schema.into_schema_ref());
        self
    }

    /// Sets the header schema.
    pub fn headers(mut self, schema: impl IntoSchemaRef) -> Self {
        self.headers = Some(schema.into_schema_ref());
        self
    }

    /// Sets the body schema.
    pub fn body(mut self, schema: impl IntoSchemaRef) -> Self {
        self.body = BodySpec::Schema(schema.into_schema_ref());
        self
    }

    /// Declares that the route takes no body.
    pub fn no_body(mut self) -> Self {
        self.body = BodySpec::NoBody;
        self
    }

    /// Sets the request content type, e.g. `multipart/form-data`.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declares a response. A later declaration for the same status wins.
    pub fn response(mut self, status: u16, spec: ResponseSpec) -> Self {
        self.responses.retain(|(existing, _)| *existing != status);
        self.responses.push((status, spec));
        self
    }

    /// Overrides whether undeclared statuses are acceptable.
    pub fn strict_status_codes(mut self, strict: bool) -> Self {
        self.strict_status_codes = Some(strict);
        self
    }

    /// Sets the summary.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the route deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Attaches free-form metadata.
    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Builds the route.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidPath`] for a malformed template and
    /// [`ContractError::InvalidStatus`] for a status outside `100..=599`.
    pub fn build(self) -> ContractResult<Route> {
        let template = parse_template(&self.path)?;

        let mut responses = BTreeMap::new();
        for (status, spec) in self.responses {
            responses.insert(check_status(&self.path, status)?, spec);
        }

        Ok(Route {
            method: self.method,
            template,
            path_params: self.path_params,
            query: self.query,
            headers: self.headers,
            body: self.body,
            responses,
            content_type: self.content_type,
            strict_status_codes: self.strict_status_codes,
            summary: self.summary,
            description: self.description,
            deprecated: self.deprecated,
            metadata: self.metadata,
        })
    }
}

/// A node of the contract tree.
#[derive(Debug, Clone)]
pub enum RouterNode {
    /// An endpoint.
    Route(Route),
    /// A nested group.
    Router(Router),
}

/// A named group of routes and routers, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Router {
    nodes: IndexMap<String, RouterNode>,
}

impl Router {
    /// Starts building a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Returns the node registered under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RouterNode> {
        self.nodes.get(key)
    }

    /// Follows a key path to a route.
    #[must_use]
    pub fn route(&self, path: &[&str]) -> Option<&Route> {
        let (last, parents) = path.split_last()?;
        let mut router = self;
        for key in parents {
            match router.nodes.get(*key)? {
                RouterNode::Router(inner) => router = inner,
                RouterNode::Route(_) => return None,
            }
        }
        match router.nodes.get(*last)? {
            RouterNode::Route(route) => Some(route),
            RouterNode::Router(_) => None,
        }
    }

    /// Iterates over direct children in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouterNode)> {
        self.nodes.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the router has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lists every route with its key path, depth first in declaration order.
    #[must_use]
    pub fn routes(&self) -> Vec<(Vec<String>, &Route)> {
        let mut out = Vec::new();
        self.collect_routes(&mut Vec::new(), &mut out);
        out
    }

    fn collect_routes<'a>(&'a self, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a Route)>) {
        for (key, node) in &self.nodes {
            prefix.push(key.clone());
            match node {
                RouterNode::Route(route) => out.push((prefix.clone(), route)),
                RouterNode::Router(inner) => inner.collect_routes(prefix, out),
            }
            prefix.pop();
        }
    }

    fn for_each_route_mut(&mut self, f: &mut dyn FnMut(&mut Route) -> ContractResult<()>) -> ContractResult<()> {
        for node in self.nodes.values_mut() {
            match node {
                RouterNode::Route(route) => f(route)?,
                RouterNode::Router(inner) => inner.for_each_route_mut(f)?,
            }
        }
        Ok(())
    }
}

enum PendingNode {
    Route(RouteBuilder),
    Router(RouterBuilder),
    Built(Router),
}

/// Builder for [`Router`].
///
/// Router-level options apply to every descendant route when the router is
/// built:
///
/// - `path_prefix` is prepended to every path
/// - `common_response` is merged into routes that do not declare that status
/// - `strict_status_codes` applies to routes that do not set it themselves
///
/// Nested routers apply their own options first, so the innermost setting
/// wins and prefixes compose outermost first.
#[derive(Default)]
#[must_use]
pub struct RouterBuilder {
    nodes: Vec<(String, PendingNode)>,
    path_prefix: Option<String>,
    common_responses: Vec<(u16, ResponseSpec)>,
    strict_status_codes: Option<bool>,
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("nodes", &self.nodes.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("path_prefix", &self.path_prefix)
            .finish_non_exhaustive()
    }
}

impl RouterBuilder {
    /// Adds a route under `key`.
    pub fn route(mut self, key: impl Into<String>, route: RouteBuilder) -> Self {
        self.nodes.push((key.into(), PendingNode::Route(route)));
        self
    }

    /// Adds a nested router under `key`.
    pub fn router(mut self, key: impl Into<String>, router: Self) -> Self {
        self.nodes.push((key.into(), PendingNode::Router(router)));
        self
    }

    /// Mounts an already built router under `key`.
    pub fn mount(mut self, key: impl Into<String>, router: Router) -> Self {
        self.nodes.push((key.into(), PendingNode::Built(router)));
        self
    }

    /// Prepends `prefix` to every descendant path.
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Declares a response shared by every descendant route.
    pub fn common_response(mut self, status: u16, spec: ResponseSpec) -> Self {
        self.common_responses.retain(|(existing, _)| *existing != status);
        self.common_responses.push((status, spec));
        self
    }

    /// Sets the default for descendant routes.
    pub fn strict_status_codes(mut self, strict: bool) -> Self {
        self.strict_status_codes = Some(strict);
        self
    }

    /// Builds the router.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContractError`] found: a malformed route, an
    /// invalid status, or a duplicate key.
    pub fn build(self) -> ContractResult<Router> {
        let mut nodes = IndexMap::with_capacity(self.nodes.len());
        for (key, pending) in self.nodes {
            let node = match pending {
                PendingNode::Route(route) => RouterNode::Route(route.build()?),
                PendingNode::Router(router) => {
                    RouterNode::Router(router.build().map_err(|e| nest_error(&key, e))?)
                }
                PendingNode::Built(router) => RouterNode::Router(router),
            };
            if nodes.contains_key(&key) {
                return Err(ContractError::DuplicateKey { key });
            }
            nodes.insert(key, node);
        }

        let mut common = BTreeMap::new();
        for (status, spec) in self.common_responses {
            let path = self.path_prefix.as_deref().unwrap_or("/");
            common.insert(check_status(path, status)?, spec);
        }

        let mut router = Router { nodes };
        let prefix = self.path_prefix;
        let strict = self.strict_status_codes;
        router.for_each_route_mut(&mut |route| {
            route.inherit(&common, strict);
            match &prefix {
                Some(prefix) => route.apply_prefix(prefix),
                None => Ok(()),
            }
        })?;
        Ok(router)
    }
}

fn nest_error(key: &str, error: ContractError) -> ContractError {
    match error {
        ContractError::DuplicateKey { key: inner } => ContractError::DuplicateKey {
            key: format!("{key}.{inner}"),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Schema;

    fn posts() -> RouterBuilder {
        Router::builder()
            .path_prefix("/posts")
            .route(
                "listPosts",
                Route::get("/").response(200, ResponseSpec::json_unchecked()),
            )
            .route(
                "getPost",
                Route::get("/:id")
                    .path_params(Schema::object([("id", Schema::string())]))
                    .response(200, ResponseSpec::json_unchecked())
                    .response(404, ResponseSpec::no_body()),
            )
    }

    #[test]
    fn test_route_builder() {
        let route = Route::post("/posts")
            .body(Schema::object([("title", Schema::string())]))
            .response(201, ResponseSpec::json_unchecked())
            .summary("Create a post")
            .deprecated()
            .build()
            .unwrap();

        assert_eq!(route.method(), Method::POST);
        assert_eq!(route.path(), "/posts");
        assert!(route.body().schema().is_some());
        assert!(route.is_declared(201));
        assert!(!route.is_declared(200));
        assert_eq!(route.summary(), Some("Create a post"));
        assert!(route.is_deprecated());
        assert!(!route.strict_status_codes());
        assert_eq!(route.to_string(), "POST /posts");
    }

    #[test]
    fn test_invalid_status_rejected() {
        let err = Route::get("/x")
            .response(600, ResponseSpec::no_body())
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidStatus { status: 600, .. }));

        let err = Route::get("/x")
            .response(99, ResponseSpec::no_body())
            .build()
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidStatus { status: 99, .. }));
    }

    #[test]
    fn test_invalid_path_rejected() {
        let err = Route::get("/posts/:").build().unwrap_err();
        assert!(matches!(err, ContractError::InvalidPath { .. }));
    }

    #[test]
    fn test_multipart_detection() {
        let route = Route::post("/upload")
            .content_type("multipart/form-data")
            .build()
            .unwrap();
        assert!(route.is_multipart());
    }

    #[test]
    fn test_nested_prefixes_compose() {
        let contract = Router::builder()
            .path_prefix("/api/v1")
            .router("posts", posts())
            .route("health", Route::get("/health"))
            .build()
            .unwrap();

        assert_eq!(
            contract.route(&["posts", "getPost"]).unwrap().path(),
            "/api/v1/posts/:id"
        );
        assert_eq!(
            contract.route(&["posts", "listPosts"]).unwrap().path(),
            "/api/v1/posts"
        );
        assert_eq!(contract.route(&["health"]).unwrap().path(), "/api/v1/health");
        assert!(contract.route(&["posts"]).is_none());
        assert!(contract.route(&["health", "x"]).is_none());
    }

    #[test]
    fn test_common_responses_merge_without_override() {
        let contract = Router::builder()
            .common_response(404, ResponseSpec::json_unchecked())
            .common_response(500, ResponseSpec::json_unchecked())
            .router("posts", posts())
            .build()
            .unwrap();

        let get = contract.route(&["posts", "getPost"]).unwrap();
        assert!(get.response(404).unwrap().is_no_body());
        assert!(get.is_declared(500));

        let list = contract.route(&["posts", "listPosts"]).unwrap();
        assert!(!list.response(404).unwrap().is_no_body());
    }

    #[test]
    fn test_strict_default_applies_unless_overridden() {
        let contract = Router::builder()
            .strict_status_codes(true)
            .route("a", Route::get("/a"))
            .route("b", Route::get("/b").strict_status_codes(false))
            .build()
            .unwrap();

        assert!(contract.route(&["a"]).unwrap().strict_status_codes());
        assert!(!contract.route(&["b"]).unwrap().strict_status_codes());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = Router::builder()
            .router(
                "posts",
                Router::builder()
                    .route("get", Route::get("/a"))
                    .route("get", Route::get("/b")),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::DuplicateKey {
                key: "posts.get".to_string()
            }
        );
    }

    #[test]
    fn test_routes_listing_in_declaration_order() {
        let contract = Router::builder()
            .route("health", Route::get("/health"))
            .router("posts", posts())
            .build()
            .unwrap();

        let keys: Vec<String> = contract
            .routes()
            .into_iter()
            .map(|(path, _)| path.join("."))
            .collect();
        assert_eq!(keys, vec!["health", "posts.listPosts", "posts.getPost"]);
    }
}
