//! Entity identifier extraction.

use thales_core::ApiResult;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::data::{entity_id_fn, EntityIdFn};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Stores the entity identifier produced by an [`EntityIdFn`].
///
/// The function may fail, e.g. on a malformed route parameter; its error
/// is reported as is.
#[derive(Clone)]
pub struct EntityIdMiddleware {
    extract: EntityIdFn,
}

impl std::fmt::Debug for EntityIdMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityIdMiddleware").finish_non_exhaustive()
    }
}

impl EntityIdMiddleware {
    /// Creates the stage from an erased extractor.
    #[must_use]
    pub fn new(extract: EntityIdFn) -> Self {
        Self { extract }
    }

    /// Creates the stage from a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Request) -> ApiResult<Uuid> + Send + Sync + 'static,
    {
        Self::new(entity_id_fn(f))
    }
}

impl Middleware for EntityIdMiddleware {
    fn name(&self) -> &'static str {
        "entity_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let entity = (self.extract)(&request)?;
            ctx.set_entity_id(entity)?;
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{build, request, run};
    use http::Method;
    use thales_core::ApiError;
    use thales_extract::uuid_from_last_segment;

    #[tokio::test]
    async fn test_entity_from_path() {
        let id = Uuid::new_v4();
        let stage = EntityIdMiddleware::from_fn(uuid_from_last_segment);
        let mut ctx = RequestContext::new(Method::GET);
        let req = build(request(Method::GET, &format!("/things/{id}")));
        let (result, calls) = run(&stage, &mut ctx, req).await;
        assert!(result.is_ok());
        assert_eq!(calls, 1);
        assert_eq!(ctx.entity_id().unwrap(), id);
    }

    #[tokio::test]
    async fn test_malformed_identifier() {
        let stage = EntityIdMiddleware::from_fn(uuid_from_last_segment);
        let mut ctx = RequestContext::new(Method::GET);
        let req = build(request(Method::GET, "/things/not-a-uuid"));
        let (result, calls) = run(&stage, &mut ctx, req).await;
        assert!(matches!(result, Err(ApiError::InvalidEntityId(_))));
        assert_eq!(calls, 0);
    }
}
