//! Configuration sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default largest accepted request body (2 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Default largest multipart field (10 MiB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Default most multipart fields.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Built-in request validation error formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    /// Issues of the first failing facet only.
    Default,
    /// All four facets, `null` where they passed.
    #[default]
    Combined,
}

/// Server-side dispatch settings.
///
/// # Example
///
/// ```toml
/// [dispatch]
/// base_path = "/api"
/// json_query = true
/// response_validation = true
/// validation_error_format = "combined"
/// max_body_size = 1048576
///
/// [dispatch.multipart]
/// max_fields = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Prefix applied to every route.
    pub base_path: String,

    /// Decode query values as JSON texts.
    pub json_query: bool,

    /// Validate handler responses.
    pub response_validation: bool,

    /// How request validation failures are answered.
    pub validation_error_format: ErrorFormat,

    /// Largest accepted request body in bytes; `None` is unlimited.
    pub max_body_size: Option<usize>,

    /// Multipart limits.
    pub multipart: MultipartLimits,

    /// Time allowed for middleware and handler, in milliseconds.
    pub request_timeout_ms: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            json_query: false,
            response_validation: false,
            validation_error_format: ErrorFormat::Combined,
            max_body_size: Some(DEFAULT_MAX_BODY_SIZE),
            multipart: MultipartLimits::default(),
            request_timeout_ms: None,
        }
    }
}

/// Multipart body limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultipartLimits {
    /// Largest field in bytes.
    pub max_field_size: usize,
    /// Most fields.
    pub max_fields: usize,
}

impl Default for MultipartLimits {
    fn default() -> Self {
        Self {
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

/// Client settings.
///
/// # Example
///
/// ```toml
/// [client]
/// base_url = "https://api.example.com"
/// throw_on_unknown_status = true
///
/// [client.headers]
/// x-api-key = "secret"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL every route path is appended to.
    pub base_url: String,

    /// Encode query values as JSON texts.
    pub json_query: bool,

    /// Return undeclared statuses as errors instead of tagging them unknown.
    pub throw_on_unknown_status: bool,

    /// Validate declared responses against their schemas.
    pub validate_response: bool,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Headers sent with every call.
    pub headers: BTreeMap<String, String>,
}
