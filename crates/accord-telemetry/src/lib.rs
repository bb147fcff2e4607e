//! Logging and metrics for Accord.
//!
//! - [`logging`] - installs a `tracing-subscriber` registry with an
//!   `EnvFilter` and a JSON or pretty formatter
//! - [`metrics`] - counters and histograms recorded by the dispatcher and
//!   the client through the `metrics` facade
//!
//! ```rust,ignore
//! use accord_telemetry::{init_logging, metrics::describe_metrics, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! // after installing a metrics recorder:
//! describe_metrics();
//! ```

#![doc(html_root_url = "https://docs.rs/accord-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
