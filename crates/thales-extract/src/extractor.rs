//! Core extractor trait.
//!
//! The [`FromRequest`] trait is the foundation for all extractors. It only
//! reads the request head; bodies are decoded separately once buffered.

use thales_core::ApiError;

/// Types that can be extracted from a request head.
///
/// # Example
///
/// ```rust
/// use thales_extract::{FromRequest, IfNoneMatch};
///
/// let request = http::Request::builder()
///     .header("if-none-match", "abc")
///     .body(())
///     .unwrap();
///
/// let IfNoneMatch(tag) = IfNoneMatch::from_request(&request).unwrap();
/// assert_eq!(tag, "abc");
/// ```
pub trait FromRequest: Sized {
    /// Performs the extraction.
    fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError>;
}

// Optional extraction: `None` if it fails
impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError> {
        Ok(T::from_request(request).ok())
    }
}

macro_rules! impl_from_request_for_tuple {
    ($($T:ident),*) => {
        impl<$($T: FromRequest),*> FromRequest for ($($T,)*) {
            fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError> {
                Ok(($($T::from_request(request)?,)*))
            }
        }
    };
}

impl_from_request_for_tuple!(T1, T2);
impl_from_request_for_tuple!(T1, T2, T3);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IfModifiedSince, IfNoneMatch, IfUnmodifiedSince};

    #[test]
    fn test_option_swallows_failure() {
        let request = http::Request::builder().body(()).unwrap();
        let extracted = Option::<IfUnmodifiedSince>::from_request(&request).unwrap();
        assert!(extracted.is_none());
    }

    #[test]
    fn test_tuple_extraction() {
        let request = http::Request::builder()
            .header("if-none-match", "v1")
            .body(())
            .unwrap();
        let (IfNoneMatch(tag), IfModifiedSince(since)) =
            <(IfNoneMatch, IfModifiedSince)>::from_request(&request).unwrap();
        assert_eq!(tag, "v1");
        assert!(since.is_none());
    }

    #[test]
    fn test_tuple_short_circuits_on_error() {
        let request = http::Request::builder().body(()).unwrap();
        let result = <(IfNoneMatch, IfUnmodifiedSince)>::from_request(&request);
        assert!(matches!(result, Err(ApiError::UnmodifiedSinceHeaderMissing)));
    }
}
