//! Platform error types.

use thiserror::Error;

/// Result alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors raised while normalizing platform messages.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The request URL could not be parsed.
    #[error("invalid request URL `{url}`: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP method is not a valid token.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    /// A header name or value could not be represented.
    #[error("invalid header `{name}`")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// The status code is outside 100..=999.
    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    /// A body flagged as base64 failed to decode.
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A body was expected to be UTF-8 text.
    #[error("body is not valid UTF-8")]
    NotUtf8,

    /// Reading a streaming body failed.
    #[error("failed to read body: {0}")]
    Body(#[from] std::io::Error),

    /// Streaming bodies can only be consumed once.
    #[error("a streaming body cannot be cloned")]
    StreamNotCloneable,

    /// JSON (de)serialization of a body failed.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlatformError {
    /// Creates an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid header error.
    #[must_use]
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }
}
