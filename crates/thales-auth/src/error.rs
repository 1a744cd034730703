//! Error types for key loading.
//!
//! Token verification failures are reported as `thales_core::ApiError`
//! since they reach the error responder; only key management uses
//! [`AuthError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type for key management operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while loading or fetching key sets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// A key file could not be read.
    #[error("failed to load keys from {path}: {message}")]
    KeyLoad {
        /// Path of the offending file or directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A key document could not be parsed as a JWK or JWK set.
    #[error("failed to parse key: {0}")]
    KeyParse(String),

    /// A remote key set could not be fetched.
    #[error("remote key set error: {0}")]
    Remote(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Creates a key load error.
    pub fn key_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::KeyLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the operation may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Io(_))
    }
}
