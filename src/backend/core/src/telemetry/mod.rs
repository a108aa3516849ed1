//! Telemetry: structured logging and metric descriptions.
//!
//! - **Logging**: `tracing-subscriber` setup with JSON/pretty/compact output
//! - **Metrics**: names and recorders emitted through the `metrics` facade
//!
//! # Example
//!
//! ```rust,no_run
//! use grantline_core::telemetry::{init_telemetry, LoggingConfig};
//!
//! init_telemetry(&LoggingConfig::default(), "production").expect("Failed to initialize telemetry");
//! ```

pub mod logging;
pub mod metrics;

pub use self::logging::{init_logging, LogFormat, LoggingConfig, SpanEventConfig};
pub use self::metrics::{describe_metrics, CacheMetrics};

/// Install the log subscriber and register metric descriptions.
///
/// Call once at startup.
pub fn init_telemetry(logging: &LoggingConfig, environment: &str) -> anyhow::Result<()> {
    describe_metrics();
    init_logging(logging, environment)?;
    ::tracing::debug!(environment, "Telemetry initialized");
    Ok(())
}
