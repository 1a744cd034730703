//! Results of caller-supplied data functions.
//!
//! Data functions signal absence with one of the two sentinels in
//! [`DataError`]; the cache stages and terminal fetches depend on
//! recognizing them. Every other failure is carried as [`DataError::Other`].

use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::error::ApiError;
use crate::validation::ValidationWrapperError;

/// Result type returned by data functions.
pub type DataResult<T> = Result<T, DataError>;

/// Hex SHA-1 of the empty byte string.
///
/// Used as the list ETag when a hash function reports no data, so an
/// empty list still produces a stable validator.
pub const EMPTY_CONTENT_HASH: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

/// Returns the lowercase hex SHA-1 of `bytes`.
#[must_use]
pub fn content_hash(bytes: impl AsRef<[u8]>) -> String {
    format!("{:x}", Sha1::digest(bytes.as_ref()))
}

/// Error returned by a data function.
#[derive(Error, Debug)]
pub enum DataError {
    /// The query matched no rows.
    #[error("no rows in result set")]
    NoRows,

    /// The addressed record does not exist.
    #[error("record does not exist")]
    DoesNotExist,

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DataError {
    /// Wraps an arbitrary error.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(anyhow::Error::new(err))
    }

    /// Whether this is one of the two absence sentinels.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NoRows | Self::DoesNotExist)
    }

    /// Returns the [`ApiError`] carried by [`DataError::Other`], if any.
    #[must_use]
    pub fn wrapped_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Other(err) => err.downcast_ref::<ApiError>(),
            _ => None,
        }
    }

    /// Returns the [`ValidationWrapperError`] carried by
    /// [`DataError::Other`], if any.
    #[must_use]
    pub fn wrapped_validation(&self) -> Option<&ValidationWrapperError> {
        match self {
            Self::Other(err) => err.downcast_ref::<ValidationWrapperError>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_hash_matches_sha1_of_nothing() {
        assert_eq!(content_hash([]), EMPTY_CONTENT_HASH);
        assert_eq!(content_hash(""), EMPTY_CONTENT_HASH);
    }

    #[test]
    fn test_content_hash_is_hex_sha1() {
        assert_eq!(
            content_hash("abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_sentinels() {
        assert!(DataError::NoRows.is_not_found());
        assert!(DataError::DoesNotExist.is_not_found());
        assert!(!DataError::from(anyhow::anyhow!("boom")).is_not_found());
    }

    #[test]
    fn test_wrapped_api_error_downcast() {
        let err = DataError::other(ApiError::NotFound);
        assert!(matches!(err.wrapped_api_error(), Some(ApiError::NotFound)));
        assert!(err.wrapped_validation().is_none());
    }
}
