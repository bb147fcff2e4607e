//! Typed configuration for Accord.
//!
//! - TOML and JSON configuration files, merged key by key
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → files → env)
//!
//! [`AccordConfig`] has three sections:
//!
//! - [`DispatchConfig`] - server-side request dispatch
//! - [`ClientConfig`] - the contract client
//! - [`LogConfig`](accord_telemetry::LogConfig) - logging
//!
//! # Example
//!
//! ```no_run
//! use accord_config::ConfigLoader;
//!
//! # fn main() -> Result<(), accord_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("accord.toml")?
//!     .with_env_prefix("ACCORD")
//!     .load()?;
//!
//! println!("routes mounted under {:?}", config.dispatch.base_path);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! base_path = "/api"
//! json_query = false
//! response_validation = true
//! validation_error_format = "combined"
//! max_body_size = 2097152
//! request_timeout_ms = 30000
//!
//! [dispatch.multipart]
//! max_field_size = 10485760
//! max_fields = 100
//!
//! [client]
//! base_url = "https://api.example.com"
//! throw_on_unknown_status = false
//! validate_response = true
//! timeout_ms = 10000
//!
//! [client.headers]
//! x-api-key = "secret"
//!
//! [logging]
//! level = "info"
//! json_format = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `ACCORD__DISPATCH__BASE_PATH=/v2`
//! - `ACCORD__DISPATCH__MAX_BODY_SIZE=none`
//! - `ACCORD__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/accord-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::AccordConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    ClientConfig, DispatchConfig, ErrorFormat, MultipartLimits, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_MAX_FIELDS, DEFAULT_MAX_FIELD_SIZE,
};
