//! # Thales Core
//!
//! Core types shared by every Thales crate:
//!
//! - [`Paging`] - Bounded offset/limit pair and its parser
//! - [`Claims`] - Verified token claims
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Cancellation`] / [`DataContext`] - What data functions receive
//! - [`DataError`] - Sentinels data functions use to signal absence
//! - [`Dto`] / [`ValidationWrapperError`] - Payload contracts
//! - [`ApiError`] - The closed error taxonomy and its status mapping

#![doc(html_root_url = "https://docs.rs/thales-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod claims;
mod context;
mod data;
mod error;
mod paging;
mod validation;

pub use claims::{Claims, DEFAULT_TENANT_CLAIM, DEFAULT_USER_CLAIM};
pub use context::{Cancellation, DataContext, RequestId};
pub use data::{content_hash, DataError, DataResult, EMPTY_CONTENT_HASH};
pub use error::{ApiError, ApiResult, ContextSlot, ErrorCategory, ErrorEnvelope};
pub use paging::{Paging, PagingOptions};
pub use validation::{BoxError, Dto, ValidationWrapperError};
