//! # Thales CRUD
//!
//! Four fixed endpoint shapes composed over the Thales pipeline. Each
//! takes the integrator's data functions and returns an [`Endpoint`]
//! that turns a request into a response.
//!
//! | Endpoint | Stages after authentication, claims and tenant scope | Success |
//! |----------|------------------------------------------------------|---------|
//! | [`get()`] | entity id → resource cache → fetch | `200` value or stream |
//! | [`list()`] | paging → list cache → total count → fetch | `200` array |
//! | [`create()`] | user → entity id → decode → validate → create | `201` |
//! | [`patch()`] | user → entity id → decode → changes → validate → precondition → patch | `200` |
//!
//! The tenant scope stage is present only when
//! [`EndpointOptionsBuilder::tenant_scoped`] or
//! [`EndpointOptionsBuilder::tenant_claim`] was used; data functions then
//! read the tenant from [`DataContext::tenant_id`](thales_core::DataContext::tenant_id).
//!
//! ## Example
//!
//! ```no_run
//! use serde::Serialize;
//! use thales_auth::{KeySet, TokenVerifier};
//! use thales_core::DataError;
//! use thales_crud::{fetch_fn, get, EndpointOptions, Fetched};
//! use thales_extract::uuid_from_last_segment;
//! use thales_middleware::{entity_id_fn, last_modified_fn};
//!
//! #[derive(Serialize)]
//! struct Thing {
//!     name: String,
//! }
//!
//! # async fn example(keys: KeySet, request: thales_middleware::Request) {
//! let options = EndpointOptions::builder(TokenVerifier::new(keys))
//!     .tenant_scoped()
//!     .build();
//!
//! let endpoint = get(
//!     "things.get",
//!     &options,
//!     entity_id_fn(uuid_from_last_segment),
//!     last_modified_fn(|_ctx, _id| async { Err(DataError::DoesNotExist) }),
//!     fetch_fn(|_ctx, _id| async {
//!         Ok(Fetched::Value(Thing { name: "gear".into() }))
//!     }),
//! );
//!
//! let response = endpoint.handle(request).await;
//! # drop(response);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/thales-crud/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod create;
mod endpoints;
pub mod fetch;
mod get;
mod list;
mod patch;
pub mod sniff;

pub use create::create;
pub use endpoints::{Endpoint, EndpointOptions, EndpointOptionsBuilder};
pub use fetch::{
    create_fn, fetch_fn, list_fn, patch_fn, CreateFn, FetchFn, Fetched, ListFn, Listed, PatchFn,
    RowStream,
};
pub use get::get;
pub use list::list;
pub use patch::patch;
pub use sniff::sniff_content_type;
