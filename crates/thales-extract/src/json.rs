//! JSON body decoding.
//!
//! Bodies are decoded after the pipeline has buffered them. Any decoding
//! failure is reported as [`ApiError::Marshalling`], which is distinct
//! from the validation failures a decoded payload may later report.

use std::ops::Deref;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thales_core::ApiError;

/// Default maximum body size (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// A decoded JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consumes the wrapper and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> Json<T> {
    /// Decodes `body`, rejecting bodies over [`DEFAULT_MAX_BODY_SIZE`].
    pub fn from_bytes(body: &Bytes) -> Result<Self, ApiError> {
        Self::from_bytes_with_limit(body, DEFAULT_MAX_BODY_SIZE)
    }

    /// Decodes `body`, rejecting bodies over `limit` bytes.
    pub fn from_bytes_with_limit(body: &Bytes, limit: usize) -> Result<Self, ApiError> {
        if body.len() > limit {
            return Err(ApiError::Marshalling(format!(
                "payload too large: max {limit} bytes, got {} bytes",
                body.len()
            )));
        }
        if body.is_empty() {
            return Err(ApiError::Marshalling("empty request body".to_string()));
        }
        serde_json::from_slice(body)
            .map(Json)
            .map_err(|e| ApiError::Marshalling(e.to_string()))
    }
}
