//! Core middleware trait and types.
//!
//! A stage implements [`Middleware`]: it either enriches the
//! [`RequestContext`] and delegates to [`Next`], short-circuits with a
//! response (a cache hit), or fails with an [`ApiError`]. Failures are
//! never turned into responses inside a stage; the pipeline hands them to
//! the error responder.
//!
//! # Example
//!
//! ```
//! use thales_core::ApiResult;
//! use thales_middleware::{BoxFuture, Middleware, Next, Request, RequestContext, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, ApiResult<Response>> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "stage chain finished");
//!             response
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use thales_core::{ApiError, ApiResult};

use crate::context::RequestContext;
use crate::types::{Request, Response};

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pipeline stage.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the stage name, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request, delegating to `next` to continue the chain.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>>;
}

/// The terminal step of a pipeline.
pub trait Handler: Send + Sync {
    /// Produces the response once every stage has run.
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, ApiResult<Response>>;
}

/// The rest of the chain after the current stage.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(&'a dyn Handler),
}

impl<'a> Next<'a> {
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    pub(crate) fn handler(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Runs the remaining stages and the handler.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> ApiResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                tracing::trace!(
                    request_id = %ctx.request_id(),
                    stage = middleware.name(),
                    "entering stage"
                );
                middleware.process(ctx, request, *next).await
            }
            NextInner::Handler(handler) => handler.call(ctx, request).await,
        }
    }
}

/// Adapts a closure into a [`Handler`].
///
/// The closure reads what it needs from the context and returns a
/// `'static` future.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Wraps `func`.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

/// Creates a [`Handler`] from a closure.
pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(&RequestContext, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    FnHandler::new(func)
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(&RequestContext, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin((self.func)(ctx, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{full_body, ResponseExt};
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;

    struct Tagging {
        name: &'static str,
    }

    impl Middleware for Tagging {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, ApiResult<Response>> {
            Box::pin(async move {
                ctx.response_headers_mut()
                    .append("x-stage", http::HeaderValue::from_static(self.name));
                next.run(ctx, request).await
            })
        }
    }

    struct Refusing;

    impl Middleware for Refusing {
        fn name(&self) -> &'static str {
            "refusing"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, ApiResult<Response>> {
            Box::pin(async { Err(ApiError::NoChanges) })
        }
    }

    fn request() -> Request {
        http::Request::new(Full::new(Bytes::new()))
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let first = Tagging { name: "first" };
        let second = Tagging { name: "second" };
        let handler = handler_fn(|_ctx: &RequestContext, _req| async {
            Ok(http::Response::new(full_body("done")))
        });
        let next = Next::new(&first, Next::new(&second, Next::handler(&handler)));

        let mut ctx = RequestContext::new(Method::GET);
        let response = next.run(&mut ctx, request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stages: Vec<_> = ctx
            .response_headers()
            .get_all("x-stage")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(stages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let refusing = Refusing;
        let tagging = Tagging { name: "never" };
        let handler = handler_fn(|_ctx: &RequestContext, _req| async {
            Ok(Response::empty(StatusCode::OK))
        });
        let next = Next::new(&refusing, Next::new(&tagging, Next::handler(&handler)));

        let mut ctx = RequestContext::new(Method::GET);
        let result = next.run(&mut ctx, request()).await;
        assert!(matches!(result, Err(ApiError::NoChanges)));
        assert!(ctx.response_headers().get("x-stage").is_none());
    }
}
