//! Bearer token extraction.
//!
//! A wholly absent `Authorization` header fails with
//! [`ApiError::MissingAuthHeader`] (401 with a challenge); any other shape
//! than `Bearer <token>` fails with [`ApiError::AuthHeaderWrongFormat`].
//!
//! [`ApiError::MissingAuthHeader`]: thales_core::ApiError::MissingAuthHeader
//! [`ApiError::AuthHeaderWrongFormat`]: thales_core::ApiError::AuthHeaderWrongFormat

use thales_auth::bearer_token;
use thales_core::ApiResult;
use tracing::trace;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Stores the bearer token in the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationMiddleware;

impl AuthenticationMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for AuthenticationMiddleware {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let token = bearer_token(request.headers())?.to_string();
            ctx.set_token(token)?;
            trace!(request_id = %ctx.request_id(), "bearer token read");
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{build, request, run};
    use http::header::AUTHORIZATION;
    use http::Method;
    use thales_core::ApiError;

    #[tokio::test]
    async fn test_token_is_stored() {
        let mut ctx = RequestContext::new(Method::GET);
        let req = build(request(Method::GET, "/things").header(AUTHORIZATION, "bearer abc.def.ghi"));
        let (result, calls) = run(&AuthenticationMiddleware, &mut ctx, req).await;
        assert!(result.is_ok());
        assert_eq!(calls, 1);
        assert_eq!(ctx.token().unwrap(), "abc.def.ghi");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let mut ctx = RequestContext::new(Method::GET);
        let (result, calls) = run(
            &AuthenticationMiddleware,
            &mut ctx,
            build(request(Method::GET, "/things")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::MissingAuthHeader)));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_wrong_shape() {
        for value in ["Basic abc", "Bearer", "Bearer a b"] {
            let mut ctx = RequestContext::new(Method::GET);
            let req = build(request(Method::GET, "/things").header(AUTHORIZATION, value));
            let (result, calls) = run(&AuthenticationMiddleware, &mut ctx, req).await;
            assert!(
                matches!(result, Err(ApiError::AuthHeaderWrongFormat)),
                "{value}"
            );
            assert_eq!(calls, 0);
        }
    }
}
