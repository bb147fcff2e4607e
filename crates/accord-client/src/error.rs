//! Client errors.

use accord_core::ResponseValidationError;
use accord_router::TemplateError;
use thiserror::Error;

use crate::classify::ClientResponse;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while building, sending or classifying a call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required path parameter had no value.
    #[error("missing value for path parameter `{name}`")]
    MissingPathParam {
        /// The parameter name.
        name: String,
    },

    /// The route's path template could not be filled.
    #[error(transparent)]
    Template(TemplateError),

    /// A header name or value cannot be sent.
    #[error("invalid header `{name}`")]
    InvalidHeader {
        /// The header name.
        name: String,
    },

    /// The request body cannot be built for this route.
    #[error("invalid request body: {reason}")]
    InvalidBody {
        /// What was wrong.
        reason: String,
    },

    /// The contract has no route at this key path.
    #[error("no route at `{path}`")]
    UnknownRoute {
        /// The key path looked up.
        path: String,
    },

    /// The call's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// The call did not finish within the configured timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The server answered with a status the route does not declare, and
    /// the client is configured to treat that as an error.
    #[error("unknown response status {}", .response.status)]
    UnknownStatus {
        /// The classified response.
        response: Box<ClientResponse>,
    },

    /// A declared response body could not be decoded.
    #[error("response with status {status} has an undecodable body: {reason}")]
    InvalidResponseBody {
        /// Response status.
        status: u16,
        /// What was wrong.
        reason: String,
    },

    /// A declared response body failed its schema.
    #[error(transparent)]
    ResponseValidation(#[from] ResponseValidationError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request client error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Failure in a non-HTTP transport.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    /// Creates an invalid body error.
    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::InvalidBody {
            reason: reason.into(),
        }
    }

    /// Wraps a transport failure.
    pub fn transport(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transport(source.into())
    }

    /// Returns the response carried by [`ClientError::UnknownStatus`].
    #[must_use]
    pub fn response(&self) -> Option<&ClientResponse> {
        match self {
            Self::UnknownStatus { response } => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ClientError::MissingPathParam {
            name: "id".to_string(),
        };
        assert_eq!(err.to_string(), "missing value for path parameter `id`");
        assert_eq!(ClientError::Cancelled.to_string(), "request cancelled");
        assert!(ClientError::invalid_body("nope").to_string().contains("nope"));
        assert!(ClientError::transport("boom").to_string().contains("boom"));
    }
}
