//! Paginated collection reads.
//!
//! authentication → claims → [tenant scope] → paging → list cache →
//! total count → list

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use thales_core::{ApiError, ApiResult};
use thales_middleware::{
    call_data, BoxFuture, CountFn, HashFn, Handler, ListCacheMiddleware, PagingMiddleware,
    Renderer, Request, RequestContext, Response, ResponseExt, TotalCountMiddleware,
};
use tracing::{debug, error};

use crate::endpoints::{Endpoint, EndpointOptions};
use crate::fetch::ListFn;

/// Builds a collection endpoint.
///
/// The page is always rendered as an array: an absent page and a fetch
/// reporting absence both render `[]`. Row streams are read to the end
/// before anything is written, so a late row error yields a clean `500`.
pub fn list<T>(
    name: &str,
    options: &EndpointOptions,
    hash: HashFn,
    count: CountFn,
    fetch: ListFn<T>,
) -> Endpoint
where
    T: Serialize + Send + 'static,
{
    let pipeline = options
        .pipeline(name)
        .add_stage(PagingMiddleware::new(options.paging()))
        .add_stage(ListCacheMiddleware::new(hash).with_cache_control(options.cache_control().clone()))
        .add_stage(TotalCountMiddleware::new(count))
        .build();
    Endpoint::new(
        pipeline,
        ListHandler {
            fetch,
            renderer: options.renderer(),
        },
    )
}

struct ListHandler<T> {
    fetch: ListFn<T>,
    renderer: Arc<dyn Renderer>,
}

impl<T> Handler for ListHandler<T>
where
    T: Serialize + Send + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            if ctx.is_head() {
                return Ok(Response::empty(StatusCode::OK));
            }

            let paging = ctx.paging()?;
            let data = ctx.data_context();
            let fetch = (self.fetch)(data.clone(), paging);
            let items = match call_data(&data, async move { fetch.await?.collect().await }).await? {
                Ok(items) => items,
                Err(err) if err.is_not_found() => {
                    debug!(request_id = %ctx.request_id(), "list fetch reported no rows");
                    Vec::new()
                }
                Err(err) => {
                    error!(request_id = %ctx.request_id(), error = %err, "list fetch failed");
                    return Err(ApiError::ErrorReceivingResults);
                }
            };

            debug!(request_id = %ctx.request_id(), items = items.len(), "list fetched");
            self.renderer.render_serialize(StatusCode::OK, &items)
        })
    }
}
