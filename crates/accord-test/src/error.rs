//! Test error types.

use accord_platform::PlatformError;
use accord_server::DispatchError;
use thiserror::Error;

/// Errors that can occur during testing.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The dispatcher returned an error instead of a response.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Reading a body failed.
    #[error("body read error: {0}")]
    BodyRead(#[from] PlatformError),

    /// The body is not UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
