//! # Accord Server
//!
//! Validation and dispatch of inbound requests against a contract.
//!
//! This crate ties the pieces together:
//!
//! - [`ServerBuilder`] - pairs a contract with handlers, by key path or as a
//!   whole implementation tree, and resolves them
//! - [`Dispatcher`] - matches requests, validates the four request facets,
//!   runs middleware and the handler, and renders the response
//! - [`ValidationErrorFormat`] - how validation failures are answered
//!
//! It does not own a socket. Framework bindings register
//! [`Dispatcher::routes`] with their own router and call
//! [`Dispatcher::dispatch_route`]; serverless entry points call
//! [`Dispatcher::dispatch_gateway`] or [`Dispatcher::dispatch`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use accord_core::{HandlerResponse, RequestContext, RequestInput};
//! use accord_server::ServerBuilder;
//! use serde_json::json;
//!
//! async fn get_post(input: RequestInput, _ctx: RequestContext) -> anyhow::Result<HandlerResponse> {
//!     Ok(HandlerResponse::json(200, json!({"id": input.param("id")})))
//! }
//!
//! let dispatcher = ServerBuilder::new(contract)
//!     .handle("posts.getPost", get_post)
//!     .build()?;
//!
//! let response = dispatcher.dispatch(request).await?;
//! ```

#![doc(html_root_url = "https://docs.rs/accord-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod dispatcher;
mod error;
mod format;
mod options;
pub mod response;

pub use builder::{RouteImpl, ServerBuilder};
pub use dispatcher::{Dispatcher, RouteInfo};
pub use error::{DispatchError, DispatchResult};
pub use format::{ValidationErrorFormat, ValidationErrorHandler};
pub use options::DispatchOptions;
