//! # Thales Test
//!
//! Helpers for testing Thales pipelines in memory.
//!
//! - [`TestKeys`] signs HS256 tokens and hands out the matching
//!   [`KeySet`](thales_auth::KeySet) and verifier.
//! - [`TestRequest`] builds pipeline requests, including the path
//!   parameters a router would record.
//! - [`TestResponse`] buffers a response and offers assertions for status,
//!   cache headers and error envelopes.
//!
//! ## Example
//!
//! ```ignore
//! use thales_test::{TestKeys, TestRequest, TestResponse};
//!
//! let keys = TestKeys::new();
//! let request = TestRequest::get("/things")
//!     .bearer_token(keys.user_token(user_id, tenant_id))
//!     .build();
//!
//! let response = TestResponse::from_http(endpoint.handle(request).await).await?;
//! response.assert_status_code(200).assert_header("x-total-count", "2");
//! ```

#![doc(html_root_url = "https://docs.rs/thales-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod keys;
mod request;
mod response;

pub use error::TestError;
pub use keys::{user_claims, TestKeys};
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
