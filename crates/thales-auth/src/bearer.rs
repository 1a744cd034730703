//! Bearer token extraction from the `Authorization` header.

use http::header::{HeaderMap, AUTHORIZATION};
use thales_core::ApiError;

/// Returns the token from an `Authorization: Bearer <token>` header.
///
/// A missing or empty header is [`ApiError::MissingAuthHeader`]. The
/// scheme is matched case-insensitively and must be followed by exactly one
/// space and a non-empty token without whitespace; anything else is
/// [`ApiError::AuthHeaderWrongFormat`].
///
/// # Example
///
/// ```
/// use http::HeaderMap;
/// use thales_auth::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("authorization", "bearer abc.def.ghi".parse().unwrap());
/// assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::MissingAuthHeader);
    };
    if value.is_empty() {
        return Err(ApiError::MissingAuthHeader);
    }
    let value = value
        .to_str()
        .map_err(|_| ApiError::AuthHeaderWrongFormat)?;

    match value.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer")
                && !token.is_empty()
                && !token.contains(char::is_whitespace) =>
        {
            Ok(token)
        }
        _ => Err(ApiError::AuthHeaderWrongFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(ApiError::MissingAuthHeader)
        ));
        assert!(matches!(
            bearer_token(&headers("")),
            Err(ApiError::MissingAuthHeader)
        ));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        for scheme in ["Bearer", "bearer", "BEARER", "bEaReR"] {
            let value = format!("{scheme} tok");
            assert_eq!(bearer_token(&headers(&value)).unwrap(), "tok");
        }
    }

    #[test]
    fn test_wrong_format() {
        for value in ["Bearer", "tok", "Basic dXNlcjpwYXNz", "Bearer a b", "Token abc"] {
            assert!(
                matches!(bearer_token(&headers(value)), Err(ApiError::AuthHeaderWrongFormat)),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_separator_is_a_single_space() {
        for value in ["Bearer  tok", "Bearer\ttok", "Bearer tok ", "Bearer\t tok", "Bearer "] {
            assert!(
                matches!(bearer_token(&headers(value)), Err(ApiError::AuthHeaderWrongFormat)),
                "{value:?} should be rejected"
            );
        }
    }
}
