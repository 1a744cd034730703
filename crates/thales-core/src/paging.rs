//! Pagination parameters.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Bounded `offset`/`limit` pair for list endpoints.
///
/// Created once per request by the paging stage and read by the list
/// cache, count and list-data stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Paging {
    /// Number of rows to skip.
    pub offset: u32,
    /// Maximum number of rows to return.
    pub limit: u16,
}

/// Limits applied while parsing paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingOptions {
    /// Limit used when the parameter is absent.
    pub default_limit: u16,
    /// Upper bound; larger limits are clamped to it.
    pub max_limit: u16,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            default_limit: Paging::DEFAULT_LIMIT,
            max_limit: Paging::MAX_LIMIT,
        }
    }
}

impl Paging {
    /// Limit used when none is requested.
    pub const DEFAULT_LIMIT: u16 = 100;
    /// Largest limit ever handed to a data function.
    pub const MAX_LIMIT: u16 = 500;

    /// Creates a paging value, clamping `limit` to [`Self::MAX_LIMIT`].
    #[must_use]
    pub fn new(offset: u32, limit: u16) -> Self {
        Self {
            offset,
            limit: limit.min(Self::MAX_LIMIT),
        }
    }

    /// Parses raw `offset` and `limit` parameters with the default bounds.
    ///
    /// Absent or empty parameters take their defaults (`0` and `100`).
    /// A limit above `500` is clamped, not rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use thales_core::Paging;
    ///
    /// assert_eq!(Paging::parse(None, None).unwrap(), Paging::new(0, 100));
    /// assert_eq!(Paging::parse(Some("20"), Some("9000")).unwrap(), Paging::new(20, 500));
    /// assert!(Paging::parse(Some("-1"), None).is_err());
    /// ```
    pub fn parse(offset: Option<&str>, limit: Option<&str>) -> Result<Self, ApiError> {
        Self::parse_with(offset, limit, PagingOptions::default())
    }

    /// Parses raw parameters using custom bounds.
    pub fn parse_with(
        offset: Option<&str>,
        limit: Option<&str>,
        options: PagingOptions,
    ) -> Result<Self, ApiError> {
        let offset = match present(offset) {
            None => 0,
            Some(raw) => digits(raw)
                .and_then(|raw| raw.parse::<u32>().ok())
                .ok_or_else(|| ApiError::InvalidOffset(raw.to_string()))?,
        };
        let max_limit = options.max_limit;
        let limit = match present(limit) {
            None => options.default_limit.min(max_limit),
            Some(raw) => {
                let requested = digits(raw)
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .ok_or_else(|| ApiError::InvalidLimit(raw.to_string()))?;
                u16::try_from(requested.min(u64::from(max_limit))).unwrap_or(max_limit)
            }
        };
        Ok(Self { offset, limit })
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

/// Unsigned decimal digits only, no sign.
fn digits(raw: &str) -> Option<&str> {
    raw.bytes().all(|b| b.is_ascii_digit()).then_some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Paging::parse(None, None).unwrap(), Paging { offset: 0, limit: 100 });
        assert_eq!(Paging::default(), Paging { offset: 0, limit: 100 });
    }

    #[test]
    fn test_empty_parameters_use_defaults() {
        assert_eq!(
            Paging::parse(Some(""), Some(" ")).unwrap(),
            Paging { offset: 0, limit: 100 }
        );
    }

    #[test]
    fn test_explicit_values() {
        assert_eq!(
            Paging::parse(Some("40"), Some("20")).unwrap(),
            Paging { offset: 40, limit: 20 }
        );
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(Paging::parse(None, Some("501")).unwrap().limit, 500);
        assert_eq!(Paging::parse(None, Some("70000")).unwrap().limit, 500);
        assert_eq!(Paging::new(0, u16::MAX).limit, 500);
    }

    #[test]
    fn test_invalid_offset() {
        for raw in ["-1", "abc", "1.5", "4294967296", "+7"] {
            match Paging::parse(Some(raw), None) {
                Err(ApiError::InvalidOffset(value)) => assert_eq!(value, raw),
                other => panic!("expected InvalidOffset for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_limit() {
        for raw in ["-5", "ten", "0x10", "+5", "1 0"] {
            assert!(matches!(
                Paging::parse(None, Some(raw)),
                Err(ApiError::InvalidLimit(_))
            ));
        }
    }

    #[test]
    fn test_custom_options() {
        let options = PagingOptions {
            default_limit: 25,
            max_limit: 50,
        };
        assert_eq!(Paging::parse_with(None, None, options).unwrap().limit, 25);
        assert_eq!(Paging::parse_with(None, Some("80"), options).unwrap().limit, 50);
    }

    proptest! {
        #[test]
        fn prop_limit_never_exceeds_max(offset in any::<u32>(), limit in any::<u64>()) {
            let offset = offset.to_string();
            let limit = limit.to_string();
            let paging = Paging::parse(Some(&offset), Some(&limit)).unwrap();
            prop_assert!(paging.limit <= Paging::MAX_LIMIT);
        }

        #[test]
        fn prop_small_limits_are_kept(limit in 0u16..=500) {
            let raw = limit.to_string();
            prop_assert_eq!(Paging::parse(None, Some(&raw)).unwrap().limit, limit);
        }
    }
}
