//! Entity creation.
//!
//! authentication → claims → [tenant scope] → user identity → entity id →
//! decode → validate → create

use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thales_core::{ApiError, ApiResult, Dto, ValidationWrapperError};
use thales_extract::Json;
use thales_middleware::{
    body_bytes, call_data, BoxFuture, EntityIdFn, EntityIdMiddleware, Handler, Renderer, Request,
    RequestContext, Response, UserIdentityMiddleware,
};
use tracing::debug;

use crate::endpoints::{Endpoint, EndpointOptions};
use crate::fetch::CreateFn;

/// Builds a creation endpoint answering `201 Created` with the value
/// `create` returns.
///
/// A body that fails to decode is a `Marshalling` error; one that
/// decodes but fails [`Dto::validate`] is a `Validation` error. Neither
/// reaches `create`. Errors from `create` are passed to the responder
/// unchanged.
pub fn create<D, R>(
    name: &str,
    options: &EndpointOptions,
    entity_id: EntityIdFn,
    create: CreateFn<D, R>,
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
        CreateHandler {
            create,
            renderer: options.renderer(),
            max_body_size: options.max_body_size(),
        },
    )
}

struct CreateHandler<D, R> {
    create: CreateFn<D, R>,
    renderer: Arc<dyn Renderer>,
    max_body_size: usize,
}

impl<D, R> Handler for CreateHandler<D, R>
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
            let dto: D = decode(request, self.max_body_size).await?;
            ValidationWrapperError::check(&dto)?;

            let data = ctx.data_context();
            let created = call_data(&data, (self.create)(data.clone(), id, dto))
                .await?
                .map_err(|err| {
                    debug!(request_id = %ctx.request_id(), error = %err, "create failed");
                    ApiError::Data(err)
                })?;

            self.renderer.render_serialize(StatusCode::CREATED, &created)
        })
    }
}

/// Reads and decodes the request body.
pub(crate) async fn decode<D: DeserializeOwned>(request: Request, limit: usize) -> ApiResult<D> {
    let body = body_bytes(request).await;
    Json::from_bytes_with_limit(&body, limit).map(Json::into_inner)
}
