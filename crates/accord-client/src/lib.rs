//! # Accord Client
//!
//! Calls the routes of an Accord contract from the outside.
//!
//! - [`build_url`] / [`prepare_request`] - turn a [`Route`](accord_core::Route)
//!   and [`RequestArgs`] into a [`PreparedRequest`]: path parameters,
//!   conventional or JSON query encoding, layered headers, JSON, form and
//!   multipart bodies
//! - [`Transport`] - executes prepared requests; [`ReqwestTransport`] is
//!   the default
//! - [`classify`] - maps the raw response back onto the route's declared
//!   statuses
//! - [`ContractClient`] - all of the above, with cancellation and timeouts

#![doc(html_root_url = "https://docs.rs/accord-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod builder;
mod classify;
mod client;
mod error;
mod transport;

pub use args::{CallBody, FilePart, FormValue, HeaderLayer, HeaderValue, RequestArgs};
pub use builder::{
    build_url, encode_multipart, merge_headers, prepare_request, BuildSettings, PreparedBody,
    PreparedRequest,
};
pub use classify::{classify, ClassifyOptions, ClientResponse, ResponseData, StatusKind};
pub use client::{ClientBuilder, ClientOptions, ContractClient};
pub use error::{ClientError, ClientResult};
pub use transport::{RawResponse, ReqwestTransport, Transport};

pub use tokio_util::sync::CancellationToken;
