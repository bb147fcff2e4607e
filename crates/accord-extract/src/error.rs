//! Extraction errors.

use accord_core::RequestValidationError;
use accord_platform::PlatformError;
use thiserror::Error;

/// Why a request could not be turned into handler input.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// One or more facets failed validation. Answered with a 400.
    #[error(transparent)]
    Invalid(#[from] RequestValidationError),

    /// The body stream failed while being read.
    #[error("failed to read request body: {0}")]
    BodyRead(#[from] PlatformError),
}

impl ExtractError {
    /// Returns the validation error, if that is what this is.
    #[must_use]
    pub fn validation(&self) -> Option<&RequestValidationError> {
        match self {
            Self::Invalid(error) => Some(error),
            Self::BodyRead(_) => None,
        }
    }
}

/// Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;
