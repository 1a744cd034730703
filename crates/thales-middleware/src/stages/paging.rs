//! Paging parameters.

use thales_core::{ApiResult, PagingOptions};
use thales_extract::paging_from_query;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Parses `offset` and `limit` from the query string into the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagingMiddleware {
    options: PagingOptions,
}

impl PagingMiddleware {
    /// Creates the stage with custom bounds.
    #[must_use]
    pub const fn new(options: PagingOptions) -> Self {
        Self { options }
    }
}

impl Middleware for PagingMiddleware {
    fn name(&self) -> &'static str {
        "paging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let paging = paging_from_query(request.uri().query(), self.options)?;
            ctx.set_paging(paging)?;
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{build, request, run};
    use http::Method;
    use thales_core::{ApiError, Paging};

    #[tokio::test]
    async fn test_defaults() {
        let mut ctx = RequestContext::new(Method::GET);
        let (result, _) = run(
            &PagingMiddleware::default(),
            &mut ctx,
            build(request(Method::GET, "/things")),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(ctx.paging().unwrap(), Paging::new(0, 100));
    }

    #[tokio::test]
    async fn test_clamped_with_custom_bounds() {
        let stage = PagingMiddleware::new(PagingOptions {
            default_limit: 10,
            max_limit: 50,
        });
        let mut ctx = RequestContext::new(Method::GET);
        let (result, _) = run(
            &stage,
            &mut ctx,
            build(request(Method::GET, "/things?offset=7&limit=80")),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(ctx.paging().unwrap(), Paging { offset: 7, limit: 50 });
    }

    #[tokio::test]
    async fn test_invalid_limit() {
        let mut ctx = RequestContext::new(Method::GET);
        let (result, calls) = run(
            &PagingMiddleware::default(),
            &mut ctx,
            build(request(Method::GET, "/things?limit=ten")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::InvalidLimit(_))));
        assert_eq!(calls, 0);
    }
}
