//! # Accord Core
//!
//! Contract model and handler types shared by the Accord server and client.
//!
//! - [`Router`] / [`Route`] - the contract tree
//! - [`SchemaValidator`] - the adapter every schema goes through, with the
//!   built-in [`Schema`] as one implementation
//! - [`flatten`] - pairs a contract with an implementation tree
//! - [`Handler`] / [`RequestContext`] - what route implementations look like
//! - [`ContractError`], [`RequestValidationError`],
//!   [`ResponseValidationError`] - errors

#![doc(html_root_url = "https://docs.rs/accord-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod contract;
mod context;
mod error;
mod handler;
pub mod resolver;
pub mod schema;
pub mod validator;

pub use context::{RequestContext, RequestHead, RequestId};
pub use contract::{
    BodySpec, ResponseSpec, Route, RouteBuilder, Router, RouterBuilder, RouterNode,
    MULTIPART_FORM_DATA,
};
pub use error::{
    ContractError, ContractResult, Facet, NodeKind, RequestValidationError,
    ResponseValidationError,
};
pub use handler::{
    BoxFuture, Handler, HandlerOutcome, HandlerResponse, HandlerResult, RequestInput,
    ResponseBody,
};
pub use resolver::{flatten, FlatRoute, ImplNode};
pub use schema::{Schema, SchemaKind};
pub use validator::{
    codes, FnValidator, IntoSchemaRef, Issue, Issues, PathItem, SchemaRef, SchemaValidator,
    ValidationMode,
};
