//! # Thales
//!
//! **Cache-aware, authenticated REST endpoints over `http` types**
//!
//! Thales composes bearer authentication, claim extraction, paging and
//! HTTP conditional requests into four endpoint shapes. Integrators
//! supply only the data functions.
//!
//! - **Get**: `Last-Modified` validation, then a value or a sniffed byte stream
//! - **List**: `ETag` validation, `X-Total-Count`, then a page
//! - **Create**: user identity, decoding and validation, then `201`
//! - **Patch**: as create, plus `If-Unmodified-Since`, then `200`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use thales::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("thales.toml")?
//!     .with_env_prefix("THALES")
//!     .load()?;
//! let options = thales::bootstrap(&config).await?;
//!
//! let endpoint = get(
//!     "things.get",
//!     &options,
//!     entity_id_fn(|req| uuid_from_last_segment(req)),
//!     last_modified_fn(|_ctx, _id| async { Ok(chrono::Utc::now()) }),
//!     fetch_fn(|_ctx, id| async move { Ok(Fetched::Value(id.to_string())) }),
//! );
//! # let _ = endpoint;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → authentication → claims → [tenant_scope] → ... → data function
//!                                                               ↓
//! Response ←──────────── error responder ←────────── any failed stage
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;

pub use bootstrap::{bootstrap, endpoint_options, load_verifier, BootstrapError};

pub use thales_auth as auth;
pub use thales_config as config;
pub use thales_core as core;
pub use thales_crud as crud;
pub use thales_extract as extract;
pub use thales_middleware as middleware;
pub use thales_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use thales::prelude::*;
/// ```
pub mod prelude {
    pub use thales_core::{
        ApiError, ApiResult, Claims, DataContext, DataError, DataResult, Dto, Paging,
        PagingOptions, ValidationWrapperError,
    };

    pub use thales_extract::{
        uuid_from_header, uuid_from_last_segment, uuid_from_path, uuid_from_query, PathParams,
    };

    pub use thales_auth::{KeySet, SharedKeySet, TokenVerifier};

    pub use thales_middleware::{
        count_fn, entity_id_fn, hash_fn, last_modified_fn, DefaultResponder, ErrorResponder,
        Request, Response,
    };

    pub use thales_crud::{
        create, create_fn, fetch_fn, get, list, list_fn, patch, patch_fn, Endpoint,
        EndpointOptions, Fetched, Listed,
    };

    pub use thales_config::{ConfigLoader, ThalesConfig};
}
