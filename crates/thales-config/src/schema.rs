//! Configuration schema types.
//!
//! Every section rejects unknown keys and fills absent keys with its
//! defaults, so a file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use thales_core::{Paging, PagingOptions, DEFAULT_USER_CLAIM};

/// Token verification and identity claims.
///
/// # Example
///
/// ```
/// use thales_config::AuthConfig;
///
/// let config = AuthConfig::default();
/// assert_eq!(config.user_claim, "user_uuid");
/// assert!(config.tenant_claim.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Directory of `*.json` JWK files loaded at startup.
    #[serde(default)]
    pub key_dir: Option<String>,

    /// URL of a remote JWKS document.
    #[serde(default)]
    pub jwks_url: Option<String>,

    /// Claim holding the caller's user UUID.
    #[serde(default = "default_user_claim")]
    pub user_claim: String,

    /// Claim holding the tenant UUID. `None` disables tenant scoping.
    #[serde(default)]
    pub tenant_claim: Option<String>,

    /// Realm advertised in `WWW-Authenticate`.
    #[serde(default = "default_realm")]
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            key_dir: None,
            jwks_url: None,
            user_claim: default_user_claim(),
            tenant_claim: None,
            realm: default_realm(),
        }
    }
}

fn default_user_claim() -> String {
    DEFAULT_USER_CLAIM.to_string()
}

fn default_realm() -> String {
    "thales".to_string()
}

/// Paging section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    /// Limit used when a request names none.
    #[serde(default = "default_limit")]
    pub default_limit: u16,

    /// Largest limit handed to a data function.
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl From<PagingConfig> for PagingOptions {
    fn from(config: PagingConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

const fn default_limit() -> u16 {
    Paging::DEFAULT_LIMIT
}

const fn default_max_limit() -> u16 {
    Paging::MAX_LIMIT
}

/// Conditional caching section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// `Cache-Control` value written by the cache stages.
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_control: default_cache_control(),
        }
    }
}

fn default_cache_control() -> String {
    "must-revalidate, max-age=0".to_string()
}

/// Error responder section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ErrorsConfig {
    /// Log the hidden cause of generalized `500` responses.
    #[serde(default = "default_true")]
    pub log_internal_causes: bool,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            log_internal_causes: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether logging is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// ANSI colours for pretty output.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            ansi_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Exporter listen address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Telemetry section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl From<&TelemetrySection> for thales_telemetry::TelemetryConfig {
    fn from(section: &TelemetrySection) -> Self {
        let pretty = section.logging.format == LogFormat::Pretty;
        Self {
            logging: thales_telemetry::LogConfig {
                enabled: section.logging.enabled,
                level: section.logging.level.clone(),
                json_format: !pretty,
                file_line_info: pretty,
                ansi: pretty && section.logging.ansi_enabled,
                include_target: true,
            },
            metrics: thales_telemetry::MetricsConfig {
                enabled: section.metrics.enabled,
                addr: section.metrics.addr.clone(),
            },
        }
    }
}

const fn default_true() -> bool {
    true
}
