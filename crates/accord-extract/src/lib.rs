//! # Accord Extract
//!
//! The request side of an Accord contract: turning a matched request into
//! validated handler input.
//!
//! - [`validate_request`] - the four-facet validation pipeline
//! - [`query`] - query decoding and encoding, including JSON query mode
//! - [`body`] - body reading and content-type decoding
//! - [`multipart`] - `multipart/form-data` bodies and uploaded files
//! - [`headers_to_value`] - headers as a JSON object
//!
//! The query encoder is shared with the client so both sides agree on the
//! wire format.

#![doc(html_root_url = "https://docs.rs/accord-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod body;
mod error;
mod headers;
pub mod multipart;
pub mod query;
mod validate;

pub use error::{ExtractError, ExtractResult};
pub use headers::headers_to_value;
pub use multipart::{MultipartConfig, UploadedFile, UploadedFiles};
pub use query::{decode_query, encode_query, QueryMode};
pub use validate::{validate_request, RequestParts, ValidatedRequest, ValidationOptions};
