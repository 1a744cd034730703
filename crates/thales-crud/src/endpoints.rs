//! Shared endpoint settings and the [`Endpoint`] type every orchestrator
//! produces.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::HeaderValue;
use thales_auth::TokenVerifier;
use thales_core::{PagingOptions, DEFAULT_TENANT_CLAIM, DEFAULT_USER_CLAIM};
use thales_extract::DEFAULT_MAX_BODY_SIZE;
use thales_middleware::{
    AuthenticationMiddleware, ClaimsMiddleware, DefaultResponder, ErrorResponder, Handler,
    JsonRenderer, Pipeline, PipelineBuilder, Renderer, Request, Response,
    TenantScopeMiddleware, DEFAULT_CACHE_CONTROL,
};

/// Settings shared by a family of endpoints.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use thales_auth::{KeySet, TokenVerifier};
/// use thales_crud::EndpointOptions;
///
/// let options = EndpointOptions::builder(TokenVerifier::new(KeySet::default()))
///     .tenant_scoped()
///     .timeout(Duration::from_secs(5))
///     .build();
/// assert_eq!(options.tenant_claim(), Some("tenant_uuid"));
/// ```
#[derive(Clone)]
pub struct EndpointOptions {
    verifier: Arc<TokenVerifier>,
    responder: Arc<dyn ErrorResponder>,
    renderer: Arc<dyn Renderer>,
    tenant_claim: Option<String>,
    user_claim: String,
    paging: PagingOptions,
    cache_control: HeaderValue,
    timeout: Option<Duration>,
    max_body_size: usize,
}

impl fmt::Debug for EndpointOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointOptions")
            .field("tenant_claim", &self.tenant_claim)
            .field("user_claim", &self.user_claim)
            .field("paging", &self.paging)
            .field("cache_control", &self.cache_control)
            .field("timeout", &self.timeout)
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

impl EndpointOptions {
    /// Starts a builder around the token verifier.
    #[must_use]
    pub fn builder(verifier: TokenVerifier) -> EndpointOptionsBuilder {
        EndpointOptionsBuilder::new(verifier)
    }

    /// Claim naming the tenant, when endpoints are tenant scoped.
    #[must_use]
    pub fn tenant_claim(&self) -> Option<&str> {
        self.tenant_claim.as_deref()
    }

    /// Claim naming the user.
    #[must_use]
    pub fn user_claim(&self) -> &str {
        &self.user_claim
    }

    /// Paging bounds for list endpoints.
    #[must_use]
    pub const fn paging(&self) -> PagingOptions {
        self.paging
    }

    /// `Cache-Control` set by the cache stages.
    #[must_use]
    pub const fn cache_control(&self) -> &HeaderValue {
        &self.cache_control
    }

    /// Largest accepted request body, in bytes.
    #[must_use]
    pub const fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    pub(crate) fn renderer(&self) -> Arc<dyn Renderer> {
        Arc::clone(&self.renderer)
    }

    /// Authentication, claims and the optional tenant scope, in that
    /// order, under `name`.
    pub(crate) fn pipeline(&self, name: &str) -> PipelineBuilder {
        Pipeline::builder()
            .endpoint(name)
            .responder(Arc::clone(&self.responder))
            .timeout(self.timeout)
            .add_stage(AuthenticationMiddleware::new())
            .add_stage(ClaimsMiddleware::new(Arc::clone(&self.verifier)))
            .add_optional_stage(self.tenant_claim.as_deref().map(TenantScopeMiddleware::new))
    }
}

/// Builder for [`EndpointOptions`].
#[must_use]
#[derive(Debug)]
pub struct EndpointOptionsBuilder {
    options: EndpointOptions,
}

impl EndpointOptionsBuilder {
    /// Defaults: JSON bodies, the default responder, no tenant scope,
    /// default paging bounds and no timeout.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            options: EndpointOptions {
                verifier: Arc::new(verifier),
                responder: Arc::new(DefaultResponder::new()),
                renderer: Arc::new(JsonRenderer::new()),
                tenant_claim: None,
                user_claim: DEFAULT_USER_CLAIM.to_string(),
                paging: PagingOptions::default(),
                cache_control: HeaderValue::from_static(DEFAULT_CACHE_CONTROL),
                timeout: None,
                max_body_size: DEFAULT_MAX_BODY_SIZE,
            },
        }
    }

    /// Replaces the error responder.
    pub fn responder(mut self, responder: Arc<dyn ErrorResponder>) -> Self {
        self.options.responder = responder;
        self
    }

    /// Replaces the body renderer.
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.options.renderer = renderer;
        self
    }

    /// Scopes every endpoint by the default tenant claim.
    pub fn tenant_scoped(self) -> Self {
        self.tenant_claim(DEFAULT_TENANT_CLAIM)
    }

    /// Scopes every endpoint by `claim`.
    pub fn tenant_claim(mut self, claim: impl Into<String>) -> Self {
        self.options.tenant_claim = Some(claim.into());
        self
    }

    /// Reads the user identifier from `claim`.
    pub fn user_claim(mut self, claim: impl Into<String>) -> Self {
        self.options.user_claim = claim.into();
        self
    }

    /// Sets the paging bounds.
    pub const fn paging(mut self, paging: PagingOptions) -> Self {
        self.options.paging = paging;
        self
    }

    /// Sets the `Cache-Control` policy.
    pub fn cache_control(mut self, value: HeaderValue) -> Self {
        self.options.cache_control = value;
        self
    }

    /// Bounds each request.
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Caps decoded request bodies.
    pub const fn max_body_size(mut self, bytes: usize) -> Self {
        self.options.max_body_size = bytes;
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> EndpointOptions {
        self.options
    }
}

/// A pipeline bound to its terminal handler.
pub struct Endpoint {
    pipeline: Pipeline,
    handler: Box<dyn Handler>,
}

impl Endpoint {
    pub(crate) fn new(pipeline: Pipeline, handler: impl Handler + 'static) -> Self {
        Self {
            pipeline,
            handler: Box::new(handler),
        }
    }

    /// Serves one request. Failures are already turned into responses.
    pub async fn handle(&self, request: Request) -> Response {
        self.pipeline.handle(request, self.handler.as_ref()).await
    }

    /// The endpoint name used in logs and metrics.
    #[must_use]
    pub fn name(&self) -> &str {
        self.pipeline.endpoint()
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
