//! Entity identifier extraction.
//!
//! Routing happens outside the pipeline. A router that matched named
//! segments stores them as a [`PathParams`] request extension; the
//! helpers below read an entity UUID from there, from the last path
//! segment, from the query string or from a header.

use thales_core::ApiError;
use uuid::Uuid;

use crate::query::query_param;

/// Named path parameters captured by the router.
///
/// # Example
///
/// ```rust
/// use thales_extract::{uuid_from_path, PathParams};
/// use uuid::Uuid;
///
/// let id = Uuid::new_v4();
/// let mut request = http::Request::builder()
///     .uri(format!("/users/{id}"))
///     .body(())
///     .unwrap();
/// request
///     .extensions_mut()
///     .insert(PathParams::new().with("user_id", id.to_string()));
///
/// assert_eq!(uuid_from_path(&request, "user_id").unwrap(), id);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a parameter, replacing an earlier one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Returns a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether no parameter was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Reads a UUID from a named path parameter.
pub fn uuid_from_path<B>(request: &http::Request<B>, name: &str) -> Result<Uuid, ApiError> {
    let raw = request
        .extensions()
        .get::<PathParams>()
        .and_then(|params| params.get(name))
        .ok_or_else(|| ApiError::InvalidEntityId(format!("missing path parameter '{name}'")))?;
    parse_uuid(raw)
}

/// Reads a UUID from the last non-empty path segment.
pub fn uuid_from_last_segment<B>(request: &http::Request<B>) -> Result<Uuid, ApiError> {
    let raw = request
        .uri()
        .path()
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .ok_or_else(|| ApiError::InvalidEntityId("empty path".to_string()))?;
    parse_uuid(raw)
}

/// Reads a UUID from a query parameter.
pub fn uuid_from_query<B>(request: &http::Request<B>, name: &str) -> Result<Uuid, ApiError> {
    let raw = query_param(request, name)
        .ok_or_else(|| ApiError::InvalidEntityId(format!("missing query parameter '{name}'")))?;
    parse_uuid(&raw)
}

/// Reads a UUID from a request header.
pub fn uuid_from_header<B>(request: &http::Request<B>, name: &str) -> Result<Uuid, ApiError> {
    let raw = request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::InvalidEntityId(format!("missing header '{name}'")))?;
    parse_uuid(raw)
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidEntityId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_param_missing() {
        let request = http::Request::builder().uri("/users/x").body(()).unwrap();
        assert!(matches!(
            uuid_from_path(&request, "user_id"),
            Err(ApiError::InvalidEntityId(_))
        ));
    }

    #[test]
    fn test_path_param_malformed() {
        let mut request = http::Request::builder().uri("/users/x").body(()).unwrap();
        request
            .extensions_mut()
            .insert(PathParams::new().with("user_id", "x"));
        match uuid_from_path(&request, "user_id") {
            Err(ApiError::InvalidEntityId(raw)) => assert_eq!(raw, "x"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_last_segment() {
        let id = Uuid::new_v4();
        let request = http::Request::builder()
            .uri(format!("/v1/users/{id}/"))
            .body(())
            .unwrap();
        assert_eq!(uuid_from_last_segment(&request).unwrap(), id);
    }

    #[test]
    fn test_query_and_header() {
        let id = Uuid::new_v4();
        let request = http::Request::builder()
            .uri(format!("/users?id={id}"))
            .header("x-entity-id", id.to_string())
            .body(())
            .unwrap();
        assert_eq!(uuid_from_query(&request, "id").unwrap(), id);
        assert_eq!(uuid_from_header(&request, "x-entity-id").unwrap(), id);
    }

    #[test]
    fn test_insert_replaces() {
        let params: PathParams = [("a", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(params.get("a"), Some("2"));
        assert!(!params.is_empty());
    }
}
