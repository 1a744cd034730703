//! `X-Total-Count` for list endpoints.

use http::header::{HeaderName, HeaderValue};
use thales_core::{ApiError, ApiResult};
use tracing::error;

use crate::context::RequestContext;
use crate::data::{call_data, CountFn};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Header carrying the total number of rows of a list.
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// Writes the row count returned by a [`CountFn`].
///
/// "No rows" / "does not exist" means a count of zero.
#[derive(Clone)]
pub struct TotalCountMiddleware {
    count: CountFn,
}

impl std::fmt::Debug for TotalCountMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotalCountMiddleware").finish_non_exhaustive()
    }
}

impl TotalCountMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new(count: CountFn) -> Self {
        Self { count }
    }
}

impl Middleware for TotalCountMiddleware {
    fn name(&self) -> &'static str {
        "total_count"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let data = ctx.data_context();
            let total = match call_data(&data, (self.count)(data.clone())).await? {
                Ok(total) => total,
                Err(err) if err.is_not_found() => 0,
                Err(err) => {
                    error!(
                        request_id = %ctx.request_id(),
                        stage = "total_count",
                        error = %err,
                        "failed to count rows"
                    );
                    return Err(ApiError::FailedToReceiveMetadata);
                }
            };
            ctx.response_headers_mut()
                .insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::count_fn;
    use crate::stages::testing::{build, request, run};
    use http::Method;
    use thales_core::DataError;

    #[tokio::test]
    async fn test_count_header() {
        let stage = TotalCountMiddleware::new(count_fn(|_ctx| async { Ok(42) }));
        let mut ctx = RequestContext::new(Method::GET);
        let (result, calls) = run(&stage, &mut ctx, build(request(Method::GET, "/things"))).await;
        assert!(result.is_ok());
        assert_eq!(calls, 1);
        assert_eq!(ctx.response_headers()[TOTAL_COUNT_HEADER], "42");
    }

    #[tokio::test]
    async fn test_not_found_is_zero() {
        let stage = TotalCountMiddleware::new(count_fn(|_ctx| async { Err(DataError::NoRows) }));
        let mut ctx = RequestContext::new(Method::GET);
        let (result, calls) = run(&stage, &mut ctx, build(request(Method::GET, "/things"))).await;
        assert!(result.is_ok());
        assert_eq!(calls, 1);
        assert_eq!(ctx.response_headers()[TOTAL_COUNT_HEADER], "0");
    }

    #[tokio::test]
    async fn test_upstream_error() {
        let stage = TotalCountMiddleware::new(count_fn(|_ctx| async {
            Err(DataError::other(std::io::Error::other("pool exhausted")))
        }));
        let mut ctx = RequestContext::new(Method::GET);
        let (result, calls) = run(&stage, &mut ctx, build(request(Method::GET, "/things"))).await;
        assert!(matches!(result, Err(ApiError::FailedToReceiveMetadata)));
        assert_eq!(calls, 0);
    }
}
