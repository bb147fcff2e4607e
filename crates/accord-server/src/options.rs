//! Dispatcher options.

use std::time::Duration;

use accord_config::{DispatchConfig, ErrorFormat};
use accord_extract::{MultipartConfig, QueryMode, ValidationOptions};

use crate::format::ValidationErrorFormat;

/// Options that apply to every route of a dispatcher.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Prefix applied to every route template, e.g. `/api`.
    pub base_path: String,
    /// Decode query values as JSON texts.
    pub json_query: bool,
    /// Validate handler responses against their declared schemas.
    pub response_validation: bool,
    /// How request validation failures are answered.
    pub validation_error_format: ValidationErrorFormat,
    /// Largest accepted request body in bytes.
    pub max_body_size: Option<usize>,
    /// Limits for multipart bodies.
    pub multipart: MultipartConfig,
    /// Time allowed for middleware and handler; `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl DispatchOptions {
    /// Options for the request pipeline.
    #[must_use]
    pub fn validation_options(&self) -> ValidationOptions {
        let mode = if self.json_query {
            QueryMode::Json
        } else {
            QueryMode::Standard
        };
        let options = ValidationOptions::default()
            .query_mode(mode)
            .multipart(self.multipart.clone());
        match self.max_body_size {
            Some(limit) => options.max_body_size(limit),
            None => options,
        }
    }
}

impl From<&DispatchConfig> for DispatchOptions {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            base_path: config.base_path.clone(),
            json_query: config.json_query,
            response_validation: config.response_validation,
            validation_error_format: match config.validation_error_format {
                ErrorFormat::Default => ValidationErrorFormat::FirstFacet,
                ErrorFormat::Combined => ValidationErrorFormat::Combined,
            },
            max_body_size: config.max_body_size,
            multipart: MultipartConfig::new()
                .max_field_size(config.multipart.max_field_size)
                .max_fields(config.multipart.max_fields),
            request_timeout: config.request_timeout_ms.map(Duration::from_millis),
        }
    }
}
