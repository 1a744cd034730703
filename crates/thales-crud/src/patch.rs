//! Partial updates with an optimistic-concurrency precondition.
//!
//! authentication → claims → [tenant scope] → user identity → entity id →
//! decode → change check → validate → `If-Unmodified-Since` → patch

use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thales_core::{ApiError, ApiResult, Dto, ValidationWrapperError};
use thales_extract::header::if_unmodified_since;
use thales_middleware::{
    call_data, BoxFuture, EntityIdFn, EntityIdMiddleware, Handler, Renderer, Request,
    RequestContext, Response, UserIdentityMiddleware,
};
use tracing::debug;

use crate::create::decode;
use crate::endpoints::{Endpoint, EndpointOptions};
use crate::fetch::PatchFn;

/// Builds a patch endpoint answering `200 OK` with the value `patch`
/// returns.
///
/// Rejections, in order: undecodable body (`400`), a payload whose
/// [`Dto::has_changes`] is false (`400`), validation errors (`400`), no
/// `If-Unmodified-Since` (`428`), an unparsable one (`400`). `patch`
/// receives the precondition and owns the comparison with stored state.
pub fn patch<D, R>(
    name: &str,
    options: &EndpointOptions,
    entity_id: EntityIdFn,
    patch: PatchFn<D, R>,
) -> Endpoint
where
    D: Dto + DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    let pipeline = options
        .pipeline(name)
        .add_stage(UserIdentityMiddleware::new(options.user_claim()))
        .add_stage(EntityIdMiddleware::new(entity_id))
        .build();
    Endpoint::new(
        pipeline,
        PatchHandler {
            patch,
            renderer: options.renderer(),
            max_body_size: options.max_body_size(),
        },
    )
}

struct PatchHandler<D, R> {
    patch: PatchFn<D, R>,
    renderer: Arc<dyn Renderer>,
    max_body_size: usize,
}

impl<D, R> Handler for PatchHandler<D, R>
where
    D: Dto + DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let id = ctx.entity_id()?;
            let precondition = if_unmodified_since(request.headers());
            let dto: D = decode(request, self.max_body_size).await?;
            if !dto.has_changes() {
                return Err(ApiError::NoChanges);
            }
            ValidationWrapperError::check(&dto)?;
            let unmodified_since = precondition?;

            let data = ctx.data_context();
            let patched = call_data(&data, (self.patch)(data.clone(), id, dto, unmodified_since))
                .await?
                .map_err(|err| {
                    debug!(request_id = %ctx.request_id(), error = %err, "patch failed");
                    ApiError::Data(err)
                })?;

            self.renderer.render_serialize(StatusCode::OK, &patched)
        })
    }
}
