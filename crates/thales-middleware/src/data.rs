//! Type-erased data functions consumed by the cache and count stages.
//!
//! Integrators write plain async closures; the constructors here box them
//! so stages can hold them behind an `Arc` and call them once per request.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thales_core::{ApiError, ApiResult, DataContext, DataResult, Paging};
use tracing::debug;
use uuid::Uuid;

use crate::middleware::BoxFuture;
use crate::types::Request;

/// Computes the content hash of a page of a list.
pub type HashFn =
    Arc<dyn Fn(DataContext, Paging) -> BoxFuture<'static, DataResult<String>> + Send + Sync>;

/// Fetches the last modification time of an entity.
pub type LastModifiedFn =
    Arc<dyn Fn(DataContext, Uuid) -> BoxFuture<'static, DataResult<DateTime<Utc>>> + Send + Sync>;

/// Counts the rows of a list.
pub type CountFn = Arc<dyn Fn(DataContext) -> BoxFuture<'static, DataResult<u64>> + Send + Sync>;

/// Reads the addressed entity identifier from the request.
pub type EntityIdFn = Arc<dyn Fn(&Request) -> ApiResult<Uuid> + Send + Sync>;

/// Wraps an async closure as a [`HashFn`].
pub fn hash_fn<F, Fut>(f: F) -> HashFn
where
    F: Fn(DataContext, Paging) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DataResult<String>> + Send + 'static,
{
    Arc::new(move |ctx, paging| Box::pin(f(ctx, paging)))
}

/// Wraps an async closure as a [`LastModifiedFn`].
pub fn last_modified_fn<F, Fut>(f: F) -> LastModifiedFn
where
    F: Fn(DataContext, Uuid) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DataResult<DateTime<Utc>>> + Send + 'static,
{
    Arc::new(move |ctx, id| Box::pin(f(ctx, id)))
}

/// Wraps an async closure as a [`CountFn`].
pub fn count_fn<F, Fut>(f: F) -> CountFn
where
    F: Fn(DataContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DataResult<u64>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Wraps a closure as an [`EntityIdFn`].
pub fn entity_id_fn<F>(f: F) -> EntityIdFn
where
    F: Fn(&Request) -> ApiResult<Uuid> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Runs a data future until it finishes or the scope in `ctx` is
/// cancelled.
///
/// # Errors
///
/// Returns [`ApiError::Cancelled`] if the request was cancelled or its
/// deadline passed first.
pub async fn call_data<T, Fut>(ctx: &DataContext, fut: Fut) -> ApiResult<DataResult<T>>
where
    Fut: Future<Output = DataResult<T>>,
{
    match ctx.cancellation().run_until_cancelled(fut).await {
        Some(result) => Ok(result),
        None => {
            debug!(request_id = %ctx.request_id(), "data call abandoned");
            Err(ApiError::Cancelled)
        }
    }
}
