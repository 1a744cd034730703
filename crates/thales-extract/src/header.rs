//! Conditional-request header extractors.
//!
//! `If-None-Match` is read as a raw opaque string. `If-Modified-Since` is
//! an optimization, so a malformed value is treated as absent.
//! `If-Unmodified-Since` is a precondition, so a missing or malformed
//! value is a hard failure.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use http::header::{HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_UNMODIFIED_SINCE};
use thales_core::ApiError;

use crate::FromRequest;

/// Raw `If-None-Match` value; empty when the header is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IfNoneMatch(pub String);

impl IfNoneMatch {
    /// Whether `tag` matches the request's value exactly.
    #[must_use]
    pub fn matches(&self, tag: &str) -> bool {
        !self.0.is_empty() && self.0 == tag
    }
}

impl FromRequest for IfNoneMatch {
    fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError> {
        Ok(Self(if_none_match(request.headers())))
    }
}

/// Parsed `If-Modified-Since`; `None` when absent or malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IfModifiedSince(pub Option<DateTime<Utc>>);

impl FromRequest for IfModifiedSince {
    fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError> {
        Ok(Self(if_modified_since(request.headers())))
    }
}

/// Parsed `If-Unmodified-Since`, required by patch requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfUnmodifiedSince(pub DateTime<Utc>);

impl FromRequest for IfUnmodifiedSince {
    fn from_request<B>(request: &http::Request<B>) -> Result<Self, ApiError> {
        if_unmodified_since(request.headers()).map(Self)
    }
}

/// Returns the raw `If-None-Match` value, or an empty string.
#[must_use]
pub fn if_none_match(headers: &HeaderMap) -> String {
    header_str(headers, &IF_NONE_MATCH)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Returns `If-Modified-Since`, logging and ignoring a malformed value.
#[must_use]
pub fn if_modified_since(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let raw = header_str(headers, &IF_MODIFIED_SINCE)?;
    match parse_http_date(raw) {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!(value = raw, error = %err, "ignoring malformed If-Modified-Since header");
            None
        }
    }
}

/// Returns `If-Unmodified-Since`.
///
/// Fails with [`ApiError::UnmodifiedSinceHeaderMissing`] when absent and
/// [`ApiError::UnmodifiedSinceHeaderInvalid`] when malformed.
pub fn if_unmodified_since(headers: &HeaderMap) -> Result<DateTime<Utc>, ApiError> {
    let Some(value) = headers.get(IF_UNMODIFIED_SINCE) else {
        return Err(ApiError::UnmodifiedSinceHeaderMissing);
    };
    let raw = value
        .to_str()
        .map_err(|err| ApiError::UnmodifiedSinceHeaderInvalid(err.to_string()))?;
    parse_http_date(raw).map_err(|_| ApiError::UnmodifiedSinceHeaderInvalid(raw.to_string()))
}

/// Parses an HTTP date (IMF-fixdate, RFC 850 or asctime).
pub fn parse_http_date(raw: &str) -> Result<DateTime<Utc>, httpdate::Error> {
    httpdate::parse_http_date(raw.trim()).map(DateTime::<Utc>::from)
}

/// Formats a timestamp as an IMF-fixdate, dropping sub-second precision.
#[must_use]
pub fn fmt_http_date(date: DateTime<Utc>) -> String {
    httpdate::fmt_http_date(to_system_time(truncate_to_seconds(date)))
}

/// Drops the sub-second part of a timestamp.
#[must_use]
pub fn truncate_to_seconds(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(date.timestamp(), 0)
        .single()
        .unwrap_or(date)
}

/// Whether two timestamps are equal at one-second granularity.
#[must_use]
pub fn same_second(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.timestamp() == b.timestamp()
}

fn to_system_time(date: DateTime<Utc>) -> SystemTime {
    match u64::try_from(date.timestamp()) {
        Ok(secs) => UNIX_EPOCH + Duration::from_secs(secs),
        Err(_) => UNIX_EPOCH,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(name: &str, value: &str) -> http::Request<()> {
        http::Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
    }

    fn empty() -> http::Request<()> {
        http::Request::builder().body(()).unwrap()
    }

    #[test]
    fn test_if_none_match_absent_is_empty() {
        let IfNoneMatch(tag) = IfNoneMatch::from_request(&empty()).unwrap();
        assert_eq!(tag, "");
        assert!(!IfNoneMatch(tag).matches(""));
    }

    #[test]
    fn test_if_none_match_is_opaque() {
        let IfNoneMatch(tag) = IfNoneMatch::from_request(&request("if-none-match", "\"abc\"")).unwrap();
        assert_eq!(tag, "\"abc\"");
        assert!(IfNoneMatch(tag.clone()).matches("\"abc\""));
        assert!(!IfNoneMatch(tag).matches("abc"));
    }

    #[test]
    fn test_if_modified_since_parses_imf_fixdate() {
        let IfModifiedSince(since) =
            IfModifiedSince::from_request(&request("if-modified-since", "Wed, 21 Oct 2015 07:28:00 GMT"))
                .unwrap();
        let expected = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(since, Some(expected));
    }

    #[test]
    fn test_if_modified_since_malformed_is_absent() {
        let IfModifiedSince(since) =
            IfModifiedSince::from_request(&request("if-modified-since", "yesterday")).unwrap();
        assert!(since.is_none());
    }

    #[test]
    fn test_if_unmodified_since_missing() {
        assert!(matches!(
            IfUnmodifiedSince::from_request(&empty()),
            Err(ApiError::UnmodifiedSinceHeaderMissing)
        ));
    }

    #[test]
    fn test_if_unmodified_since_malformed() {
        match IfUnmodifiedSince::from_request(&request("if-unmodified-since", "2015-10-21")) {
            Err(ApiError::UnmodifiedSinceHeaderInvalid(raw)) => assert_eq!(raw, "2015-10-21"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_if_unmodified_since_valid() {
        let IfUnmodifiedSince(date) =
            IfUnmodifiedSince::from_request(&request("if-unmodified-since", "Sun, 06 Nov 1994 08:49:37 GMT"))
                .unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap());
    }

    #[test]
    fn test_fmt_http_date_truncates() {
        let date = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()
            + chrono::Duration::milliseconds(999);
        assert_eq!(fmt_http_date(date), "Wed, 21 Oct 2015 07:28:00 GMT");
    }

    proptest! {
        #[test]
        fn prop_subsecond_differences_are_the_same_second(
            secs in 0i64..4_000_000_000,
            a in 0u32..1_000_000_000,
            b in 0u32..1_000_000_000,
        ) {
            let t1 = Utc.timestamp_opt(secs, a).unwrap();
            let t2 = Utc.timestamp_opt(secs, b).unwrap();
            prop_assert!(same_second(t1, t2));
            prop_assert_eq!(truncate_to_seconds(t1), truncate_to_seconds(t2));
        }

        #[test]
        fn prop_formatted_date_round_trips_to_truncated(secs in 0i64..4_000_000_000, nanos in 0u32..1_000_000_000) {
            let t = Utc.timestamp_opt(secs, nanos).unwrap();
            let parsed = parse_http_date(&fmt_http_date(t)).unwrap();
            prop_assert!(same_second(parsed, t));
        }
    }
}
