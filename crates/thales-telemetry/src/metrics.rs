//! Pipeline metrics.
//!
//! Counters are recorded through the `metrics` facade, so recording is a
//! no-op until a recorder is installed. [`init_metrics`] installs the
//! Prometheus exporter.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `thales_responses_total` | Counter | `endpoint`, `status` |
//! | `thales_cache_checks_total` | Counter | `kind` (`list`, `resource`), `result` (`hit`, `miss`, `skipped`) |
//! | `thales_token_validations_total` | Counter | `result` (`valid`, `malformed`, `rejected`, `empty`) |

use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Responses written, by endpoint and status.
pub const RESPONSES_TOTAL: &str = "thales_responses_total";
/// Conditional-request checks, by kind and result.
pub const CACHE_CHECKS_TOTAL: &str = "thales_cache_checks_total";
/// Token verifications, by result.
pub const TOKEN_VALIDATIONS_TOTAL: &str = "thales_token_validations_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus exporter.
    pub enabled: bool,

    /// Address the exporter listens on.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus exporter and describes the pipeline metrics.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidAddress`] for an unparsable address
/// and [`TelemetryError::MetricsInit`] if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let handle = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    describe_metrics();
    tracing::info!(%addr, "metrics recorder installed");
    Ok(())
}

/// Renders metrics in Prometheus text format, if the exporter is
/// installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(RESPONSES_TOTAL, "Responses written by the pipeline");
    describe_counter!(CACHE_CHECKS_TOTAL, "Conditional-request checks by outcome");
    describe_counter!(TOKEN_VALIDATIONS_TOTAL, "Bearer token verifications by outcome");
}

/// Records a response written for `endpoint`.
pub fn record_response(endpoint: &str, status: u16) {
    counter!(
        RESPONSES_TOTAL,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Records the outcome of a list or resource cache check.
pub fn record_cache_check(kind: &'static str, result: &'static str) {
    counter!(CACHE_CHECKS_TOTAL, "kind" => kind, "result" => result).increment(1);
}

/// Records the outcome of a token verification.
pub fn record_token_validation(result: &'static str) {
    counter!(TOKEN_VALIDATIONS_TOTAL, "result" => result).increment(1);
}
