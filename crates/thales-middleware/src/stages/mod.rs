//! Pipeline stages.
//!
//! Orchestrators compose these in a fixed order:
//!
//! 1. [`authentication`] - read the bearer token
//! 2. [`claims`] - verify the token and store its claims
//! 3. [`scope`] - optional tenant scope taken from a claim
//! 4. [`user`] - user identifier taken from a claim (writes only)
//! 5. [`entity`] - addressed entity identifier
//! 6. [`paging`] - `offset`/`limit` (lists only)
//! 7. [`list_cache`] / [`resource_cache`] - conditional-request checks
//! 8. [`total_count`] - `X-Total-Count` (lists only)

pub mod authentication;
pub mod claims;
pub mod entity;
pub mod list_cache;
pub mod paging;
pub mod resource_cache;
pub mod scope;
pub mod total_count;
pub mod user;

pub use authentication::AuthenticationMiddleware;
pub use claims::ClaimsMiddleware;
pub use entity::EntityIdMiddleware;
pub use list_cache::ListCacheMiddleware;
pub use paging::PagingMiddleware;
pub use resource_cache::ResourceCacheMiddleware;
pub use scope::TenantScopeMiddleware;
pub use total_count::{TotalCountMiddleware, TOTAL_COUNT_HEADER};
pub use user::UserIdentityMiddleware;

/// Default `Cache-Control` policy: always revalidate, never re-transfer
/// on a match.
pub const DEFAULT_CACHE_CONTROL: &str = "must-revalidate, max-age=0";
