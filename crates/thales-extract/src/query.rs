//! Query string extractors.
//!
//! The [`Query`] extractor deserializes URL query parameters into a typed
//! struct; [`PagingQuery`] reads `offset` and `limit` into a bounded
//! [`Paging`] value.

use std::ops::Deref;

use serde::de::DeserializeOwned;
use thales_core::{ApiError, Paging, PagingOptions};

use crate::FromRequest;

/// Extractor that deserializes the query string into `T`.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use thales_extract::{FromRequest, Query};
///
/// #[derive(Deserialize)]
/// struct Filter {
///     name: Option<String>,
/// }
///
/// let request = http::Request::builder()
///     .uri("/users?name=ada")
///     .body(())
///     .unwrap();
/// let Query(filter) = Query::<Filter>::from_request(&request).unwrap();
/// assert_eq!(filter.name.as_deref(), Some("ada"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    /// Consumes the extractor and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Query<T> {
    fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError> {
        let query_string = request.uri().query().unwrap_or("");
        let value: T = serde_urlencoded::from_str(query_string)
            .map_err(|e| ApiError::Marshalling(format!("query string: {e}")))?;
        Ok(Query(value))
    }
}

/// Paging parsed from the `offset` and `limit` query parameters with the
/// default bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingQuery(pub Paging);

impl FromRequest for PagingQuery {
    fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError> {
        paging_from_query(request.uri().query(), PagingOptions::default()).map(Self)
    }
}

/// Parses `offset` and `limit` from a raw query string.
///
/// When a parameter is repeated the first occurrence wins. Absent or
/// empty parameters use the defaults in `options`.
pub fn paging_from_query(query: Option<&str>, options: PagingOptions) -> Result<Paging, ApiError> {
    let query = query.unwrap_or("");
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };
    Paging::parse_with(first("offset"), first("limit"), options)
}

/// Returns the first value of a query parameter.
#[must_use]
pub fn query_param<B>(request: &http::Request<B>, name: &str) -> Option<String> {
    let query = request.uri().query()?;
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    pairs
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> http::Request<()> {
        http::Request::builder().uri(uri).body(()).unwrap()
    }

    #[test]
    fn test_no_parameters_use_defaults() {
        let PagingQuery(paging) = PagingQuery::from_request(&get("/items")).unwrap();
        assert_eq!(paging, Paging { offset: 0, limit: 100 });
    }

    #[test]
    fn test_parameters_are_read() {
        let PagingQuery(paging) =
            PagingQuery::from_request(&get("/items?offset=10&limit=25&sort=name")).unwrap();
        assert_eq!(paging, Paging { offset: 10, limit: 25 });
    }

    #[test]
    fn test_first_occurrence_wins() {
        let PagingQuery(paging) =
            PagingQuery::from_request(&get("/items?limit=5&limit=50")).unwrap();
        assert_eq!(paging.limit, 5);
    }

    #[test]
    fn test_large_limit_is_clamped() {
        let PagingQuery(paging) = PagingQuery::from_request(&get("/items?limit=10000")).unwrap();
        assert_eq!(paging.limit, Paging::MAX_LIMIT);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            PagingQuery::from_request(&get("/items?offset=minus")),
            Err(ApiError::InvalidOffset(_))
        ));
        assert!(matches!(
            PagingQuery::from_request(&get("/items?limit=-3")),
            Err(ApiError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_query_param() {
        let request = get("/items?id=a%20b&id=c");
        assert_eq!(query_param(&request, "id").as_deref(), Some("a b"));
        assert_eq!(query_param(&request, "other"), None);
    }
}
