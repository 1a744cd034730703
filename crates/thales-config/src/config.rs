//! Root configuration type.
//!
//! This module provides [`ThalesConfig`] and its builder.

use serde::{Deserialize, Serialize};
use thales_core::PagingOptions;
use thales_telemetry::TelemetryConfig;

use crate::{AuthConfig, CacheConfig, ConfigError, ErrorsConfig, PagingConfig, TelemetrySection};

/// Complete configuration of a Thales service.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use thales_config::ThalesConfig;
///
/// let config = ThalesConfig::default();
/// assert_eq!(config.paging.max_limit, 500);
/// assert_eq!(config.cache.cache_control, "must-revalidate, max-age=0");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ThalesConfig {
    /// Token verification and identity claims.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Paging defaults and bounds.
    #[serde(default)]
    pub paging: PagingConfig,

    /// Conditional caching.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Error responder.
    #[serde(default)]
    pub errors: ErrorsConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl ThalesConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ThalesConfigBuilder {
        ThalesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `paging.max_limit` is zero
    /// - `paging.default_limit` is zero or above `paging.max_limit`
    /// - a claim name is empty
    /// - `cache.cache_control` is not a valid header value
    /// - metrics are enabled with an unparsable address
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paging.max_limit == 0 {
            return Err(ConfigError::invalid_value(
                "paging.max_limit",
                "must be greater than zero",
            ));
        }

        if self.paging.default_limit == 0 || self.paging.default_limit > self.paging.max_limit {
            return Err(ConfigError::invalid_value(
                "paging.default_limit",
                format!("must be between 1 and {}", self.paging.max_limit),
            ));
        }

        if self.auth.user_claim.is_empty() {
            return Err(ConfigError::invalid_value("auth.user_claim", "must not be empty"));
        }

        if self.auth.tenant_claim.as_deref() == Some("") {
            return Err(ConfigError::invalid_value(
                "auth.tenant_claim",
                "must not be empty when set",
            ));
        }

        if !is_header_value(&self.cache.cache_control) {
            return Err(ConfigError::invalid_value(
                "cache.cache_control",
                "must be visible ASCII",
            ));
        }

        if self.telemetry.metrics.enabled
            && self
                .telemetry
                .metrics
                .addr
                .parse::<std::net::SocketAddr>()
                .is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Local development: pretty, coloured `debug` logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = crate::LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config
    }

    /// Production: JSON `info` logs and the Prometheus exporter.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = crate::LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config
    }

    /// Paging options for the paging stage.
    #[must_use]
    pub fn paging_options(&self) -> PagingOptions {
        self.paging.into()
    }

    /// Telemetry settings for [`thales_telemetry::init_telemetry`].
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::from(&self.telemetry)
    }
}

fn is_header_value(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
}

/// Builder for [`ThalesConfig`].
#[derive(Debug, Default)]
pub struct ThalesConfigBuilder {
    auth: Option<AuthConfig>,
    paging: Option<PagingConfig>,
    cache: Option<CacheConfig>,
    errors: Option<ErrorsConfig>,
    telemetry: Option<TelemetrySection>,
}

impl ThalesConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the auth section.
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the paging section.
    #[must_use]
    pub fn paging(mut self, paging: PagingConfig) -> Self {
        self.paging = Some(paging);
        self
    }

    /// Set the cache section.
    #[must_use]
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the errors section.
    #[must_use]
    pub fn errors(mut self, errors: ErrorsConfig) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> ThalesConfig {
        ThalesConfig {
            auth: self.auth.unwrap_or_default(),
            paging: self.paging.unwrap_or_default(),
            cache: self.cache.unwrap_or_default(),
            errors: self.errors.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<ThalesConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
