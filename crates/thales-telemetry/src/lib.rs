//! Logging and metrics for Thales services.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output and an
//!   `EnvFilter` directive.
//! - **Metrics**: counters through the `metrics` facade, optionally
//!   exported in Prometheus format.
//!
//! # Example
//!
//! ```rust,no_run
//! use thales_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .log_level("info,thales_middleware=debug")
//!     .metrics_addr("0.0.0.0:9090")
//!     .build();
//!
//! init_telemetry(&config)?;
//! # Ok::<(), thales_telemetry::TelemetryError>(())
//! ```
//!
//! # Exported metrics
//!
//! ```text
//! # TYPE thales_responses_total counter
//! thales_responses_total{endpoint="things.get",status="200"} 1234
//! thales_responses_total{endpoint="things.get",status="304"} 560
//! # TYPE thales_cache_checks_total counter
//! thales_cache_checks_total{kind="resource",result="hit"} 560
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initialises logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem failure.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
