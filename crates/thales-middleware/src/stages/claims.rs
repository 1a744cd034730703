//! Token verification.

use std::sync::Arc;

use thales_auth::TokenVerifier;
use thales_core::{ApiError, ApiResult};
use thales_telemetry::metrics::record_token_validation;
use tracing::debug;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Verifies the stored bearer token and stores its claims.
///
/// A token whose claims object is empty fails with
/// [`ApiError::ClaimsMissing`].
#[derive(Debug, Clone)]
pub struct ClaimsMiddleware {
    verifier: Arc<TokenVerifier>,
}

impl ClaimsMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl Middleware for ClaimsMiddleware {
    fn name(&self) -> &'static str {
        "claims"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let verified = self.verifier.verify(ctx.token()?);
            let claims = match verified {
                Ok(claims) => claims,
                Err(err) => {
                    let result = if matches!(err, ApiError::TokenMalformed(_)) {
                        "malformed"
                    } else {
                        "rejected"
                    };
                    record_token_validation(result);
                    debug!(request_id = %ctx.request_id(), result, error = %err, "token refused");
                    return Err(err);
                }
            };
            if claims.is_empty() {
                record_token_validation("empty");
                return Err(ApiError::ClaimsMissing);
            }
            record_token_validation("valid");
            ctx.set_claims(claims)?;
            next.run(ctx, request).await
        })
    }
}
