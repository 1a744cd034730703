//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is composed once at construction time from an ordered
//! list of stages and a terminal [`Handler`]. Per request it:
//!
//! 1. applies the endpoint deadline to the request's cancellation scope,
//! 2. runs the stages in order, each of which may short-circuit,
//! 3. hands any failure to the single [`ErrorResponder`],
//! 4. merges the headers stages accumulated into the final response,
//! 5. drops the body of `HEAD` responses.

use std::sync::Arc;
use std::time::Duration;

use http::header::HeaderValue;
use thales_core::ApiError;
use thales_telemetry::metrics::record_response;
use tracing::{debug, info};

use crate::context::{RequestContext, REQUEST_ID_HEADER};
use crate::middleware::{Handler, Middleware, Next};
use crate::responder::{DefaultResponder, ErrorResponder};
use crate::types::{empty_body, Request, Response};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Endpoint name used in logs and metrics when none is configured.
pub const DEFAULT_ENDPOINT: &str = "unnamed";

/// A fixed-order middleware pipeline.
///
/// # Example
///
/// ```
/// use thales_middleware::{handler_fn, Pipeline, RequestContext, Response, ResponseExt};
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder().endpoint("ping").build();
/// let handler = handler_fn(|_ctx: &RequestContext, _req| async {
///     Ok(Response::empty(http::StatusCode::NO_CONTENT))
/// });
///
/// let request = http::Request::new(http_body_util::Full::new(bytes::Bytes::new()));
/// let response = pipeline.handle(request, &handler).await;
/// assert_eq!(response.status(), http::StatusCode::NO_CONTENT);
/// # });
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    responder: Arc<dyn ErrorResponder>,
    timeout: Option<Duration>,
    endpoint: String,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("endpoint", &self.endpoint)
            .field("stages", &self.stage_names())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes `request` with a context derived from its headers.
    pub async fn handle(&self, request: Request, handler: &dyn Handler) -> Response {
        let ctx = RequestContext::for_request(&request);
        self.process(ctx, request, handler).await
    }

    /// Processes `request` through every stage and `handler`.
    ///
    /// Never fails: errors from any stage or the handler are turned into
    /// responses by the configured responder.
    pub async fn process(
        &self,
        mut ctx: RequestContext,
        request: Request,
        handler: &dyn Handler,
    ) -> Response {
        if let Some(timeout) = self.timeout {
            ctx.apply_timeout(timeout);
        }
        let cancellation = ctx.cancellation().clone();

        let next = self.build_chain(handler);
        let result = cancellation
            .run_until_cancelled(next.run(&mut ctx, request))
            .await
            .unwrap_or(Err(ApiError::Cancelled));

        let mut response = match result {
            Ok(response) => response,
            Err(err) => self.responder.respond(&ctx, &err),
        };

        let extra = ctx.take_response_headers();
        for name in extra.keys() {
            if response.headers().contains_key(name) {
                continue;
            }
            for value in extra.get_all(name) {
                response.headers_mut().append(name.clone(), value.clone());
            }
        }
        if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        if ctx.is_head() {
            *response.body_mut() = empty_body();
        }

        let status = response.status().as_u16();
        record_response(&self.endpoint, status);
        info!(
            request_id = %ctx.request_id(),
            endpoint = %self.endpoint,
            method = %ctx.method(),
            status,
            elapsed_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
        response
    }

    fn build_chain<'a>(&'a self, handler: &'a dyn Handler) -> Next<'a> {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
    responder: Arc<dyn ErrorResponder>,
    timeout: Option<Duration>,
    endpoint: String,
}

impl PipelineBuilder {
    /// Creates a builder with no stages and the default responder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            responder: Arc::new(DefaultResponder::new()),
            timeout: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Appends a stage; stages run in the order they are added.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn add_boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Appends `middleware` only when present.
    #[must_use]
    pub fn add_optional_stage<M: Middleware>(self, middleware: Option<M>) -> Self {
        match middleware {
            Some(middleware) => self.add_stage(middleware),
            None => self,
        }
    }

    /// Sets the error responder.
    #[must_use]
    pub fn responder(mut self, responder: Arc<dyn ErrorResponder>) -> Self {
        self.responder = responder;
        self
    }

    /// Bounds the whole request, stages and handler included.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Names the endpoint in logs and metrics.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        debug!(
            endpoint = %self.endpoint,
            stages = self.stages.len(),
            "pipeline built"
        );
        Pipeline {
            stages: self.stages,
            responder: self.responder,
            timeout: self.timeout,
            endpoint: self.endpoint,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
