//! Typed, layered configuration for Thales services.
//!
//! Configuration is loaded in layers, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A TOML or JSON file
//! 3. `PREFIX__SECTION__KEY` environment variables
//!
//! Unknown keys in a file are rejected.
//!
//! # Example
//!
//! ```no_run
//! use thales_config::ConfigLoader;
//!
//! # fn main() -> Result<(), thales_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("thales.toml")?
//!     .with_env_prefix("THALES")
//!     .load()?;
//!
//! let paging = config.paging_options();
//! let telemetry = config.telemetry_config();
//! # let _ = (paging, telemetry);
//! # Ok(())
//! # }
//! ```
//!
//! # Sections
//!
//! ```toml
//! [auth]
//! key_dir = "/etc/thales/keys"
//! user_claim = "user_uuid"
//! tenant_claim = "tenant_uuid"
//! realm = "thales"
//!
//! [paging]
//! default_limit = 100
//! max_limit = 500
//!
//! [cache]
//! cache_control = "must-revalidate, max-age=0"
//!
//! [errors]
//! log_internal_causes = true
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = false
//! addr = "0.0.0.0:9090"
//! ```
//!
//! Environment overrides follow the same paths, for example
//! `THALES__PAGING__MAX_LIMIT=200` or `THALES__TELEMETRY__LOGGING__LEVEL=debug`.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{ThalesConfig, ThalesConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    AuthConfig, CacheConfig, ErrorsConfig, LogFormat, LoggingConfig, MetricsConfig, PagingConfig,
    TelemetrySection,
};
