//! Single-resource reads.
//!
//! authentication → claims → [tenant scope] → entity id → resource cache →
//! fetch

use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;
use thales_core::{ApiError, ApiResult};
use thales_middleware::{
    call_data, stream_body, BoxFuture, ByteStream, EntityIdFn, EntityIdMiddleware, Handler,
    LastModifiedFn, Renderer, Request, RequestContext, ResourceCacheMiddleware, Response,
    ResponseExt,
};
use tracing::{debug, error};

use crate::endpoints::{Endpoint, EndpointOptions};
use crate::fetch::{FetchFn, Fetched};
use crate::sniff::sniff_stream;

/// Builds a single-resource endpoint.
///
/// A `304` is answered from `last_modified` without calling `fetch`.
/// `fetch` reporting absence yields `404`; any other failure yields a
/// generic `500`. `HEAD` stops after the cache stage.
pub fn get<T>(
    name: &str,
    options: &EndpointOptions,
    entity_id: EntityIdFn,
    last_modified: LastModifiedFn,
    fetch: FetchFn<T>,
) -> Endpoint
where
    T: Serialize + Send + 'static,
{
    let pipeline = options
        .pipeline(name)
        .add_stage(EntityIdMiddleware::new(entity_id))
        .add_stage(
            ResourceCacheMiddleware::new(last_modified)
                .with_cache_control(options.cache_control().clone()),
        )
        .build();
    Endpoint::new(
        pipeline,
        GetHandler {
            fetch,
            renderer: options.renderer(),
        },
    )
}

struct GetHandler<T> {
    fetch: FetchFn<T>,
    renderer: Arc<dyn Renderer>,
}

impl<T> Handler for GetHandler<T>
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

            let id = ctx.entity_id()?;
            let data = ctx.data_context();
            let fetched = match call_data(&data, (self.fetch)(data.clone(), id)).await? {
                Ok(fetched) => fetched,
                Err(err) if err.is_not_found() => {
                    debug!(request_id = %ctx.request_id(), entity_id = %id, "entity not found");
                    return Err(ApiError::NotFound);
                }
                Err(err) => {
                    error!(
                        request_id = %ctx.request_id(),
                        entity_id = %id,
                        error = %err,
                        "fetch failed"
                    );
                    return Err(ApiError::ErrorReceivingResults);
                }
            };

            match fetched {
                Fetched::Value(value) => self.renderer.render_serialize(StatusCode::OK, &value),
                Fetched::Stream(stream) => stream_response(ctx, stream).await,
            }
        })
    }
}

async fn stream_response(ctx: &RequestContext, stream: ByteStream) -> ApiResult<Response> {
    let (content_type, stream) = sniff_stream(stream).await.map_err(|err| {
        error!(request_id = %ctx.request_id(), error = %err, "reading streamed result failed");
        ApiError::ErrorReceivingResults
    })?;
    let content_type = HeaderValue::from_str(content_type.as_ref())
        .map_err(|e| ApiError::Render(e.to_string()))?;

    let mut response = Response::new(stream_body(stream));
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    Ok(response)
}
