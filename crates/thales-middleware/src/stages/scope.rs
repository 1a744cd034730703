//! Tenant scope taken from a claim.
//!
//! Inserted right after the claims stage on scoped endpoints. Every data
//! function downstream reads the tenant through
//! [`DataContext::tenant_id`](thales_core::DataContext::tenant_id).

use thales_core::{ApiError, ApiResult, DEFAULT_TENANT_CLAIM};
use tracing::trace;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Stores the tenant identifier named by a claim.
#[derive(Debug, Clone)]
pub struct TenantScopeMiddleware {
    claim: String,
}

impl Default for TenantScopeMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_TENANT_CLAIM)
    }
}

impl TenantScopeMiddleware {
    /// Reads the tenant from `claim`.
    #[must_use]
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
        }
    }

    /// The claim holding the tenant identifier.
    #[must_use]
    pub fn claim(&self) -> &str {
        &self.claim
    }
}

impl Middleware for TenantScopeMiddleware {
    fn name(&self) -> &'static str {
        "tenant_scope"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let tenant = ctx
                .claims()?
                .require_uuid(&self.claim, ApiError::MissingTenantUuid)?;
            ctx.set_tenant_id(tenant)?;
            trace!(request_id = %ctx.request_id(), %tenant, "tenant scope set");
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{build, request, run};
    use http::Method;
    use serde_json::json;
    use thales_core::Claims;
    use uuid::Uuid;

    fn ctx_with(claims: serde_json::Value) -> RequestContext {
        let mut ctx = RequestContext::new(Method::GET);
        let serde_json::Value::Object(map) = claims else {
            unreachable!()
        };
        ctx.set_claims(Claims::new(map)).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_tenant_from_default_claim() {
        let tenant = Uuid::new_v4();
        let mut ctx = ctx_with(json!({"tenant_uuid": tenant.to_string()}));
        let (result, calls) = run(
            &TenantScopeMiddleware::default(),
            &mut ctx,
            build(request(Method::GET, "/")),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls, 1);
        assert_eq!(ctx.tenant_id().unwrap(), tenant);
        assert_eq!(ctx.data_context().tenant_id().unwrap(), tenant);
    }

    #[tokio::test]
    async fn test_custom_claim_name() {
        let tenant = Uuid::new_v4();
        let mut ctx = ctx_with(json!({"org": tenant.to_string()}));
        let stage = TenantScopeMiddleware::new("org");
        let (result, _) = run(&stage, &mut ctx, build(request(Method::GET, "/"))).await;
        assert!(result.is_ok());
        assert_eq!(ctx.tenant_id().unwrap(), tenant);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_tenant() {
        for claims in [json!({"sub": "x"}), json!({"tenant_uuid": "nope"})] {
            let mut ctx = ctx_with(claims);
            let (result, calls) = run(
                &TenantScopeMiddleware::default(),
                &mut ctx,
                build(request(Method::GET, "/")),
            )
            .await;
            assert!(matches!(result, Err(ApiError::MissingTenantUuid)));
            assert_eq!(calls, 0);
        }
    }
}
