//! Platform-agnostic HTTP messages for Accord.
//!
//! Hosting runtimes disagree on what a request or response looks like: an
//! API-gateway event is a JSON document with optional base64 bodies, a
//! cloud-function entrypoint hands over a native `http::Request`, and
//! conventional frameworks have their own types again. This crate defines the
//! [`UniversalRequest`] and [`UniversalResponse`] value types the rest of
//! Accord works with, plus mappers to and from the native shapes.
//!
//! # Modules
//!
//! - [`body`] - absent, text, binary and streaming bodies
//! - [`encoding`] - base64 conversion and text/binary content-type detection
//! - [`cookie`] - splitting combined `Set-Cookie` headers
//! - [`mappers`] - API-gateway events and native `http` messages
//!
//! # Example
//!
//! ```rust
//! use accord_platform::{Body, UniversalRequest};
//! use http::Method;
//!
//! let request = UniversalRequest::builder(Method::POST, "https://api.example.com/posts?draft=1")
//!     .header("content-type", "application/json")
//!     .body(Body::text(r#"{"title":"hi"}"#))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.path(), "/posts");
//! assert_eq!(request.query(), Some("draft=1"));
//! ```

#![forbid(unsafe_code)]

pub mod body;
pub mod cookie;
pub mod encoding;
mod error;
pub mod mappers;
mod request;
mod response;

pub use body::{Body, BodyStream};
pub use cookie::{set_cookie_values, split_cookies_string};
pub use encoding::{base64_to_bytes, bytes_to_base64, is_text_content_type};
pub use error::{PlatformError, PlatformResult};
pub use request::{UniversalRequest, UniversalRequestBuilder};
pub use response::{RawBody, UniversalResponse};
