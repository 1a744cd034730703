//! User identifier taken from a claim.

use thales_core::{ApiError, ApiResult, DEFAULT_USER_CLAIM};

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Stores the caller's user identifier; absent or unparsable values fail
/// with [`ApiError::MissingUserUuid`].
#[derive(Debug, Clone)]
pub struct UserIdentityMiddleware {
    claim: String,
}

impl Default for UserIdentityMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_USER_CLAIM)
    }
}

impl UserIdentityMiddleware {
    /// Reads the user from `claim`.
    #[must_use]
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
        }
    }
}

impl Middleware for UserIdentityMiddleware {
    fn name(&self) -> &'static str {
        "user_identity"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ApiResult<Response>> {
        Box::pin(async move {
            let user = ctx
                .claims()?
                .require_uuid(&self.claim, ApiError::MissingUserUuid)?;
            ctx.set_user_id(user)?;
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{build, request, run};
    use http::Method;
    use serde_json::{json, Map, Value};
    use thales_core::Claims;
    use uuid::Uuid;

    fn claims(value: Value) -> Claims {
        Claims::new(value.as_object().cloned().unwrap_or_else(Map::new))
    }

    #[tokio::test]
    async fn test_user_is_stored() {
        let user = Uuid::new_v4();
        let mut ctx = RequestContext::new(Method::POST);
        ctx.set_claims(claims(json!({"user_uuid": user.to_string()})))
            .unwrap();
        let (result, calls) = run(
            &UserIdentityMiddleware::default(),
            &mut ctx,
            build(request(Method::POST, "/")),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls, 1);
        assert_eq!(ctx.user_id().unwrap(), user);
    }

    #[tokio::test]
    async fn test_missing_user() {
        let mut ctx = RequestContext::new(Method::POST);
        ctx.set_claims(claims(json!({"sub": "ada"}))).unwrap();
        let (result, calls) = run(
            &UserIdentityMiddleware::default(),
            &mut ctx,
            build(request(Method::POST, "/")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::MissingUserUuid)));
        assert_eq!(calls, 0);
    }
}
