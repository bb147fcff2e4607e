//! Rendering request validation failures.

use std::fmt;
use std::sync::Arc;

use accord_core::{RequestContext, RequestValidationError};
use accord_platform::UniversalResponse;
use http::StatusCode;
use serde_json::{json, Value};

/// A user function that turns a validation failure into a response.
pub type ValidationErrorHandler =
    Arc<dyn Fn(&RequestValidationError, &RequestContext) -> UniversalResponse + Send + Sync>;

/// How a [`RequestValidationError`] is answered.
///
/// Both built-in formats respond with `400 Bad Request`.
#[derive(Clone, Default)]
pub enum ValidationErrorFormat {
    /// Only the issues of the first failing facet, in the order path
    /// parameters, headers, query, body. Configured as `"default"`.
    FirstFacet,
    /// `{pathParameterErrors, headerErrors, queryParameterErrors,
    /// bodyErrors}` with `null` for facets that passed. Configured as
    /// `"combined"`.
    #[default]
    Combined,
    /// A user function.
    Custom(ValidationErrorHandler),
}

impl ValidationErrorFormat {
    /// Wraps a function.
    pub fn custom<F>(handler: F) -> Self
    where
        F: Fn(&RequestValidationError, &RequestContext) -> UniversalResponse + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(handler))
    }

    /// Looks up a built-in format by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::FirstFacet),
            "combined" => Some(Self::Combined),
            _ => None,
        }
    }

    /// Renders `error`.
    #[must_use]
    pub fn render(&self, error: &RequestValidationError, ctx: &RequestContext) -> UniversalResponse {
        match self {
            Self::FirstFacet => {
                let body = error
                    .first()
                    .and_then(|(_, issues)| serde_json::to_value(issues).ok())
                    .unwrap_or(Value::Null);
                UniversalResponse::json(StatusCode::BAD_REQUEST, body)
            }
            Self::Combined => {
                let body = serde_json::to_value(error).unwrap_or_else(|_| json!({}));
                UniversalResponse::json(StatusCode::BAD_REQUEST, body)
            }
            Self::Custom(handler) => handler(error, ctx),
        }
    }
}

impl fmt::Debug for ValidationErrorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstFacet => f.write_str("FirstFacet"),
            Self::Combined => f.write_str("Combined"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
