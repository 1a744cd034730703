//! Resource-level conditional requests (`Last-Modified` /
//! `If-Modified-Since`).
//!
//! Timestamps are compared at one-second granularity because HTTP dates
//! carry no sub-second part. When the last-modified lookup reports "not
//! found" the check is skipped and the chain continues: whether the
//! resource exists is decided by the terminal fetch, so this stage never
//! produces a `404` itself.

use http::header::{HeaderValue, CACHE_CONTROL, LAST_MODIFIED};
use thales_core::{ApiError, ApiResult};
use thales_extract::header::{fmt_http_date, if_modified_since, same_second};
use thales_telemetry::metrics::record_cache_check;
use tracing::{debug, error};

use crate::context::RequestContext;
use crate::data::{call_data, LastModifiedFn};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::DEFAULT_CACHE_CONTROL;
use crate::types::{Request, Response, ResponseExt};

/// Validates `If-Modified-Since` against the entity's modification time.
#[derive(Clone)]
pub struct ResourceCacheMiddleware {
    last_modified: LastModifiedFn,
    cache_control: HeaderValue,
}

impl std::fmt::Debug for ResourceCacheMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCacheMiddleware")
            .field("cache_control", &self.cache_control)
            .finish_non_exhaustive()
    }
}

impl ResourceCacheMiddleware {
    /// Creates the stage with the default `Cache-Control` policy.
    #[must_use]
    pub fn new(last_modified: LastModifiedFn) -> Self {
        Self {
            last_modified,
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

impl Middleware for ResourceCacheMiddleware {
    fn name(&self) -> &'static str {
        "resource_cache"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let entity = ctx.entity_id()?;
            let data = ctx.data_context();
            let modified = match call_data(&data, (self.last_modified)(data.clone(), entity)).await? {
                Ok(modified) => modified,
                Err(err) if err.is_not_found() => {
                    record_cache_check("resource", "skipped");
                    debug!(request_id = %ctx.request_id(), %entity, "no modification time, skipping cache check");
                    return next.run(ctx, request).await;
                }
                Err(err) => {
                    error!(
                        request_id = %ctx.request_id(),
                        stage = "resource_cache",
                        %entity,
                        error = %err,
                        "failed to fetch modification time"
                    );
                    return Err(ApiError::FailedToReceiveMetadata);
                }
            };

            let headers = ctx.response_headers_mut();
            headers.insert(CACHE_CONTROL, self.cache_control.clone());
            if let Ok(value) = HeaderValue::from_str(&fmt_http_date(modified)) {
                headers.insert(LAST_MODIFIED, value);
            }

            let fresh = if_modified_since(request.headers())
                .is_some_and(|since| same_second(modified, since));
            if fresh {
                record_cache_check("resource", "hit");
                debug!(request_id = %ctx.request_id(), %entity, "resource not modified");
                return Ok(Response::not_modified());
            }
            record_cache_check("resource", "miss");
            next.run(ctx, request).await
        })
    }
}
