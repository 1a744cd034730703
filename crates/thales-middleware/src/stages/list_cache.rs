//! List-level conditional requests (`ETag` / `If-None-Match`).
//!
//! The integrator's hash function computes a content hash for the
//! requested page. A "no rows" / "does not exist" result is replaced by
//! [`EMPTY_CONTENT_HASH`] so an empty list still gets a stable tag. The
//! hash is sent as `ETag` and compared verbatim to `If-None-Match`; on a
//! match the stage answers `304 Not Modified` and the rest of the chain
//! never runs.

use http::header::{HeaderValue, CACHE_CONTROL, ETAG};
use thales_core::{ApiError, ApiResult, EMPTY_CONTENT_HASH};
use thales_extract::{FromRequest, IfNoneMatch};
use thales_telemetry::metrics::record_cache_check;
use tracing::{debug, error, warn};

use crate::context::RequestContext;
use crate::data::{call_data, HashFn};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::DEFAULT_CACHE_CONTROL;
use crate::types::{Request, Response, ResponseExt};

/// Validates `If-None-Match` against the page's content hash.
#[derive(Clone)]
pub struct ListCacheMiddleware {
    hash: HashFn,
    cache_control: HeaderValue,
}

impl std::fmt::Debug for ListCacheMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListCacheMiddleware")
            .field("cache_control", &self.cache_control)
            .finish_non_exhaustive()
    }
}

impl ListCacheMiddleware {
    /// Creates the stage with the default `Cache-Control` policy.
    #[must_use]
    pub fn new(hash: HashFn) -> Self {
        Self {
            hash,
            cache_control: HeaderValue::from_static(DEFAULT_CACHE_CONTROL),
        }
    }

    /// Overrides the `Cache-Control` value.
    #[must_use]
    pub fn with_cache_control(mut self, cache_control: HeaderValue) -> Self {
        self.cache_control = cache_control;
        self
    }
}

impl Middleware for ListCacheMiddleware {
    fn name(&self) -> &'static str {
        "list_cache"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let paging = ctx.paging()?;
            let data = ctx.data_context();
            let hash = match call_data(&data, (self.hash)(data.clone(), paging)).await? {
                Ok(hash) => hash,
                Err(err) if err.is_not_found() => EMPTY_CONTENT_HASH.to_string(),
                Err(err) => {
                    error!(
                        request_id = %ctx.request_id(),
                        stage = "list_cache",
                        error = %err,
                        "failed to compute list hash"
                    );
                    return Err(ApiError::FailedToReceiveMetadata);
                }
            };

            ctx.response_headers_mut()
                .insert(CACHE_CONTROL, self.cache_control.clone());
            match HeaderValue::from_str(&hash) {
                Ok(etag) => {
                    ctx.response_headers_mut().insert(ETAG, etag);
                }
                Err(_) => {
                    warn!(request_id = %ctx.request_id(), "list hash is not a valid header value");
                }
            }

            if IfNoneMatch::from_request(&request)?.matches(&hash) {
                record_cache_check("list", "hit");
                debug!(request_id = %ctx.request_id(), %hash, "list not modified");
                return Ok(Response::not_modified());
            }
            record_cache_check("list", "miss");
            next.run(ctx, request).await
        })
    }
}
