//! # Accord
//!
//! **Typed HTTP contracts shared by server and client.**
//!
//! A contract is a tree of routers whose leaves are routes: a method, a
//! path template, schemas for path parameters, query, headers and body, and
//! the responses each status may carry. The same contract drives both sides:
//!
//! - the server validates every inbound request against it before a handler
//!   runs, and renders handler output through the declared responses
//! - the client builds URLs, headers and bodies from it and classifies
//!   responses by the statuses it declares
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use accord::prelude::*;
//! use serde_json::json;
//!
//! let contract = Router::builder()
//!     .route(
//!         "getPost",
//!         Route::get("/posts/:id").response(200, ResponseSpec::json_unchecked()),
//!     )
//!     .build()?;
//!
//! async fn get_post(input: RequestInput, _ctx: RequestContext) -> anyhow::Result<HandlerResponse> {
//!     Ok(HandlerResponse::json(200, json!({"id": input.param("id")})))
//! }
//!
//! let dispatcher = ServerBuilder::new(contract.clone())
//!     .handle("getPost", get_post)
//!     .build()?;
//!
//! let client = ContractClient::builder("https://api.example.com").build();
//! let response = client
//!     .call_path(&contract, "getPost", RequestArgs::new().param("id", 1))
//!     .await?;
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → match → path/headers/query/body validation → pre-hooks
//!                                                          ↓
//! Response ← response pipeline ← post-hooks ← middleware → handler
//! ```

#![doc(html_root_url = "https://docs.rs/accord/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Contract model, schemas, handlers
pub use accord_core as core;

// Path templates and route matching
pub use accord_router as router;

// Request and response shapes shared by every runtime
pub use accord_platform as platform;

// Query, body and multipart decoding, request validation
pub use accord_extract as extract;

// Middleware and pipeline hooks
pub use accord_middleware as middleware;

// Dispatch
pub use accord_server as server;

// Contract client
pub use accord_client as client;

// Logging and metrics
pub use accord_telemetry as telemetry;

// Layered configuration
pub use accord_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use accord::prelude::*;
/// ```
pub mod prelude {
    pub use accord_core::{
        flatten, ContractError, ContractResult, Handler, HandlerOutcome, HandlerResponse,
        ImplNode, RequestContext, RequestId, RequestInput, ResponseSpec, Route, Router, Schema,
        SchemaValidator, ValidationMode,
    };

    pub use accord_platform::{Body, UniversalRequest, UniversalResponse};

    pub use accord_extract::{QueryMode, UploadedFiles};

    pub use accord_middleware::{FnMiddleware, Middleware, Next, Pipeline};

    pub use accord_server::{DispatchOptions, Dispatcher, ServerBuilder, ValidationErrorFormat};

    pub use accord_client::{
        CancellationToken, ClientError, ClientOptions, ClientResponse, ContractClient,
        RequestArgs, StatusKind,
    };

    pub use accord_config::{AccordConfig, ConfigLoader};

    pub use accord_telemetry::{init_logging, LogConfig};
}
