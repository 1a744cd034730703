//! The single seam turning failures into responses.
//!
//! Every stage and handler reports failures as an [`ApiError`]; the
//! pipeline passes them to an [`ErrorResponder`], so formatting stays
//! consistent across all failure origins.

use std::sync::Arc;

use http::header::{HeaderValue, WWW_AUTHENTICATE};
use thales_core::ApiError;
use tracing::{error, warn};

use crate::context::RequestContext;
use crate::render::{JsonRenderer, Renderer};
use crate::types::{Response, ResponseExt};

/// Default `Bearer` realm advertised on `401` responses.
pub const DEFAULT_REALM: &str = "thales";

/// Maps a failure to a response.
///
/// Any `Fn(&RequestContext, &ApiError) -> Response` closure is a
/// responder, so integrators can override or extend the mapping.
pub trait ErrorResponder: Send + Sync + 'static {
    /// Builds the response for `error`.
    fn respond(&self, ctx: &RequestContext, error: &ApiError) -> Response;
}

impl<F> ErrorResponder for F
where
    F: Fn(&RequestContext, &ApiError) -> Response + Send + Sync + 'static,
{
    fn respond(&self, ctx: &RequestContext, error: &ApiError) -> Response {
        self(ctx, error)
    }
}

/// Writes `{"status", "status_text", "errors"}` bodies.
///
/// `MissingAuthHeader` responses carry `WWW-Authenticate: Bearer
/// realm="..."`; malformed credentials do not.
#[derive(Clone)]
pub struct DefaultResponder {
    realm: String,
    renderer: Arc<dyn Renderer>,
    log_internal_causes: bool,
}

impl std::fmt::Debug for DefaultResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultResponder")
            .field("realm", &self.realm)
            .field("content_type", &self.renderer.content_type())
            .field("log_internal_causes", &self.log_internal_causes)
            .finish()
    }
}

impl Default for DefaultResponder {
    fn default() -> Self {
        Self {
            realm: DEFAULT_REALM.to_string(),
            renderer: Arc::new(JsonRenderer::new()),
            log_internal_causes: true,
        }
    }
}

impl DefaultResponder {
    /// Creates a responder rendering JSON with the default realm.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the realm used in `WWW-Authenticate`.
    #[must_use]
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Sets the renderer for error bodies.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Whether hidden causes of generalized failures are logged.
    #[must_use]
    pub const fn log_internal_causes(mut self, enabled: bool) -> Self {
        self.log_internal_causes = enabled;
        self
    }

    fn log(&self, ctx: &RequestContext, err: &ApiError) {
        let status = err.status_code().as_u16();
        let category = err.category().as_str();
        if err.is_server_error() {
            if self.log_internal_causes {
                error!(
                    request_id = %ctx.request_id(),
                    status,
                    category,
                    error = %err,
                    cause = ?std::error::Error::source(err),
                    "request failed"
                );
            } else {
                error!(request_id = %ctx.request_id(), status, category, "request failed");
            }
        } else {
            warn!(
                request_id = %ctx.request_id(),
                status,
                category,
                error = %err,
                "request rejected"
            );
        }
    }
}

impl ErrorResponder for DefaultResponder {
    fn respond(&self, ctx: &RequestContext, err: &ApiError) -> Response {
        self.log(ctx, err);

        let status = err.status_code();
        let envelope = err.to_envelope();
        let mut response = match self.renderer.render_serialize(status, &envelope) {
            Ok(response) => response,
            Err(render_err) => {
                error!(request_id = %ctx.request_id(), error = %render_err, "failed to render error body");
                Response::empty(status)
            }
        };

        if matches!(err, ApiError::MissingAuthHeader) {
            let challenge = format!("Bearer realm=\"{}\"", self.realm);
            match HeaderValue::from_str(&challenge) {
                Ok(value) => {
                    response.headers_mut().insert(WWW_AUTHENTICATE, value);
                }
                Err(_) => {
                    warn!(realm = %self.realm, "realm is not a valid header value");
                }
            }
        }
        response
    }
}
