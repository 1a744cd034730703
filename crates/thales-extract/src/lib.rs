//! # Thales Extract
//!
//! Typed request extractors for the Thales pipeline.
//!
//! | Extractor | Source | Failure |
//! |-----------|--------|---------|
//! | [`IfNoneMatch`] | `If-None-Match` | never; empty when absent |
//! | [`IfModifiedSince`] | `If-Modified-Since` | never; malformed is absent |
//! | [`IfUnmodifiedSince`] | `If-Unmodified-Since` | 428 when absent, 400 when malformed |
//! | [`PagingQuery`] | `offset` / `limit` | `InvalidOffset` / `InvalidLimit` |
//! | [`Query<T>`] | query string | `Marshalling` |
//! | [`Json<T>`] | buffered body | `Marshalling` |
//!
//! Entity identifiers are read with [`uuid_from_path`],
//! [`uuid_from_last_segment`], [`uuid_from_query`] or [`uuid_from_header`],
//! all of which fail with `InvalidEntityId`.
//!
//! ## Example
//!
//! ```rust
//! use thales_extract::{FromRequest, IfNoneMatch, PagingQuery};
//!
//! let request = http::Request::builder()
//!     .uri("/items?limit=20")
//!     .header("if-none-match", "3f786850e387550fdab836ed7e6dc881de23001b")
//!     .body(())
//!     .unwrap();
//!
//! let (IfNoneMatch(tag), PagingQuery(paging)) =
//!     <(IfNoneMatch, PagingQuery)>::from_request(&request).unwrap();
//! assert_eq!(paging.limit, 20);
//! assert!(!tag.is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/thales-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod extractor;
pub mod header;
mod json;
mod path;
mod query;

pub use extractor::FromRequest;
pub use header::{
    fmt_http_date, if_modified_since, if_none_match, if_unmodified_since, parse_http_date,
    same_second, truncate_to_seconds, IfModifiedSince, IfNoneMatch, IfUnmodifiedSince,
};
pub use json::{Json, DEFAULT_MAX_BODY_SIZE};
pub use path::{uuid_from_header, uuid_from_last_segment, uuid_from_path, uuid_from_query, PathParams};
pub use query::{paging_from_query, query_param, PagingQuery, Query};
