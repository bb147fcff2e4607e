//! Dispatch errors.

use accord_platform::PlatformError;
use thiserror::Error;

/// Failures the dispatcher hands back to the hosting framework.
///
/// Request validation failures and response validation failures are not
/// errors at this level: they are answered with a 400 and an opaque 500.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The handler (or a middleware in front of it) returned an error.
    #[error("handler for `{route}` failed: {source}")]
    Handler {
        /// Dotted key path of the route.
        route: String,
        /// The handler's error.
        #[source]
        source: anyhow::Error,
    },

    /// The request could not be read: a failing body stream, or a native
    /// request or gateway event that does not form a valid request.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// `dispatch_route` was called with an index the dispatcher does not
    /// have.
    #[error("no route with index {index}")]
    UnknownRoute {
        /// The index requested.
        index: usize,
    },
}

impl DispatchError {
    /// Creates a handler error.
    pub fn handler(route: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            route: route.into(),
            source,
        }
    }

    /// Returns the route key path for handler errors.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        match self {
            Self::Handler { route, .. } => Some(route),
            _ => None,
        }
    }
}

/// Result type for dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_handler_error_keeps_source() {
        let error = DispatchError::handler("posts.getPost", anyhow::anyhow!("database down"));
        assert_eq!(error.route(), Some("posts.getPost"));
        assert_eq!(
            error.to_string(),
            "handler for `posts.getPost` failed: database down"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn test_unknown_route_display() {
        let error = DispatchError::UnknownRoute { index: 7 };
        assert_eq!(error.to_string(), "no route with index 7");
        assert!(error.route().is_none());
    }
}
