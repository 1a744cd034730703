//! # Thales Middleware
//!
//! The request pipeline: ordered stages, a strongly typed request-scoped
//! value store and the conditional-cache validators.
//!
//! ## Flow
//!
//! ```text
//! Request → Authentication → Claims → [TenantScope] → … → Cache check → Handler
//!              │                │             │                │
//!              └──── any failure ─────────────┴──→ ErrorResponder → Response
//! ```
//!
//! | Stage | Middleware | Context slot written |
//! |-------|------------|----------------------|
//! | Authentication | [`AuthenticationMiddleware`] | token |
//! | Claims | [`ClaimsMiddleware`] | claims |
//! | Tenant scope | [`TenantScopeMiddleware`] | tenant id |
//! | User identity | [`UserIdentityMiddleware`] | user id |
//! | Entity | [`EntityIdMiddleware`] | entity id |
//! | Paging | [`PagingMiddleware`] | paging |
//! | List cache | [`ListCacheMiddleware`] | `ETag`, `Cache-Control` |
//! | Resource cache | [`ResourceCacheMiddleware`] | `Last-Modified`, `Cache-Control` |
//! | Total count | [`TotalCountMiddleware`] | `X-Total-Count` |
//!
//! Every stage either enriches the [`RequestContext`] and delegates to
//! [`Next`], answers `304 Not Modified`, or fails with an
//! [`ApiError`](thales_core::ApiError) that the [`Pipeline`] hands to its
//! [`ErrorResponder`].
//!
//! ## Example
//!
//! ```
//! use thales_middleware::stages::PagingMiddleware;
//! use thales_middleware::{handler_fn, Pipeline, RequestContext, Response, ResponseExt};
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::builder()
//!     .endpoint("things.list")
//!     .add_stage(PagingMiddleware::default())
//!     .build();
//!
//! let handler = handler_fn(|ctx: &RequestContext, _req| {
//!     let paging = ctx.paging();
//!     async move {
//!         assert_eq!(paging?.limit, 100);
//!         Ok(Response::empty(http::StatusCode::OK))
//!     }
//! });
//!
//! let request = http::Request::builder()
//!     .uri("/things")
//!     .body(http_body_util::Full::new(bytes::Bytes::new()))
//!     .unwrap();
//! assert_eq!(pipeline.handle(request, &handler).await.status(), http::StatusCode::OK);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/thales-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod data;
pub mod middleware;
pub mod pipeline;
pub mod render;
pub mod responder;
pub mod stages;
pub mod types;

pub use context::{RequestContext, REQUEST_ID_HEADER};
pub use data::{
    call_data, count_fn, entity_id_fn, hash_fn, last_modified_fn, CountFn, EntityIdFn, HashFn,
    LastModifiedFn,
};
pub use middleware::{handler_fn, BoxFuture, FnHandler, Handler, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use render::{JsonRenderer, Renderer};
pub use responder::{DefaultResponder, ErrorResponder, DEFAULT_REALM};
pub use stages::{
    AuthenticationMiddleware, ClaimsMiddleware, EntityIdMiddleware, ListCacheMiddleware,
    PagingMiddleware, ResourceCacheMiddleware, TenantScopeMiddleware, TotalCountMiddleware,
    UserIdentityMiddleware, DEFAULT_CACHE_CONTROL, TOTAL_COUNT_HEADER,
};
pub use types::{
    body_bytes, empty_body, full_body, stream_body, Body, ByteStream, Request, Response,
    ResponseExt,
};
