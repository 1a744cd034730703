//! Request-scoped value store.
//!
//! [`RequestContext`] carries the values stages produce down the pipeline:
//! token, claims, user identifier, entity identifier, tenant identifier
//! and paging. Each slot is write-once; reading a slot that no earlier
//! stage produced fails with [`ApiError::MissingInContext`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{HeaderMap, Method};
use thales_core::{
    ApiError, ApiResult, Cancellation, Claims, ContextSlot, DataContext, Paging, RequestId,
};
use uuid::Uuid;

/// Header used to propagate a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request state threaded through the pipeline.
///
/// # Example
///
/// ```
/// use http::Method;
/// use thales_core::{ApiError, ContextSlot, Paging};
/// use thales_middleware::RequestContext;
///
/// let mut ctx = RequestContext::new(Method::GET);
/// assert!(matches!(ctx.paging(), Err(ApiError::MissingInContext(ContextSlot::Paging))));
///
/// ctx.set_paging(Paging::default()).unwrap();
/// assert_eq!(ctx.paging().unwrap().limit, 100);
/// assert!(ctx.set_paging(Paging::default()).is_err());
/// ```
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    cancellation: Cancellation,
    started_at: Instant,

    token: Option<String>,
    claims: Option<Arc<Claims>>,
    user_id: Option<Uuid>,
    entity_id: Option<Uuid>,
    tenant_id: Option<Uuid>,
    paging: Option<Paging>,

    response_headers: HeaderMap,
}

impl RequestContext {
    /// Creates a context with a fresh request id and root cancellation.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            cancellation: Cancellation::new(),
            started_at: Instant::now(),
            token: None,
            claims: None,
            user_id: None,
            entity_id: None,
            tenant_id: None,
            paging: None,
            response_headers: HeaderMap::new(),
        }
    }

    /// Creates a context for `request`, propagating a valid
    /// `x-request-id` header or generating a new id.
    #[must_use]
    pub fn for_request<B>(request: &http::Request<B>) -> Self {
        let propagated = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .map(RequestId::from_uuid);
        let mut ctx = Self::new(request.method().clone());
        if let Some(request_id) = propagated {
            ctx.request_id = request_id;
        }
        ctx
    }

    /// Replaces the cancellation scope, e.g. with one tied to the
    /// client connection.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Whether the request is a `HEAD` request.
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Returns the request's cancellation scope.
    #[must_use]
    pub const fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Tightens the request deadline.
    pub fn apply_timeout(&mut self, timeout: Duration) {
        self.cancellation = self.cancellation.clone().with_timeout(timeout);
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Builds the view handed to a data function, with a child
    /// cancellation scope.
    #[must_use]
    pub fn data_context(&self) -> DataContext {
        DataContext::new(self.request_id, self.cancellation.child())
            .with_claims(self.claims.clone())
            .with_user_id(self.user_id)
            .with_tenant_id(self.tenant_id)
    }

    /// Returns the bearer token.
    pub fn token(&self) -> ApiResult<&str> {
        self.token
            .as_deref()
            .ok_or(ApiError::MissingInContext(ContextSlot::Token))
    }

    /// Stores the bearer token.
    pub fn set_token(&mut self, token: impl Into<String>) -> ApiResult<()> {
        set_once(&mut self.token, token.into(), ContextSlot::Token)
    }

    /// Returns the verified claims.
    pub fn claims(&self) -> ApiResult<&Claims> {
        self.claims
            .as_deref()
            .ok_or(ApiError::MissingInContext(ContextSlot::Claims))
    }

    /// Stores the verified claims.
    pub fn set_claims(&mut self, claims: Claims) -> ApiResult<()> {
        set_once(&mut self.claims, Arc::new(claims), ContextSlot::Claims)
    }

    /// Returns the caller's user identifier.
    pub fn user_id(&self) -> ApiResult<Uuid> {
        self.user_id
            .ok_or(ApiError::MissingInContext(ContextSlot::UserId))
    }

    /// Stores the caller's user identifier.
    pub fn set_user_id(&mut self, user_id: Uuid) -> ApiResult<()> {
        set_once(&mut self.user_id, user_id, ContextSlot::UserId)
    }

    /// Returns the addressed entity identifier.
    pub fn entity_id(&self) -> ApiResult<Uuid> {
        self.entity_id
            .ok_or(ApiError::MissingInContext(ContextSlot::EntityId))
    }

    /// Stores the addressed entity identifier.
    pub fn set_entity_id(&mut self, entity_id: Uuid) -> ApiResult<()> {
        set_once(&mut self.entity_id, entity_id, ContextSlot::EntityId)
    }

    /// Returns the tenant scope.
    pub fn tenant_id(&self) -> ApiResult<Uuid> {
        self.tenant_id
            .ok_or(ApiError::MissingInContext(ContextSlot::TenantId))
    }

    /// Stores the tenant scope.
    pub fn set_tenant_id(&mut self, tenant_id: Uuid) -> ApiResult<()> {
        set_once(&mut self.tenant_id, tenant_id, ContextSlot::TenantId)
    }

    /// Returns the parsed paging.
    pub fn paging(&self) -> ApiResult<Paging> {
        self.paging
            .ok_or(ApiError::MissingInContext(ContextSlot::Paging))
    }

    /// Stores the parsed paging.
    pub fn set_paging(&mut self, paging: Paging) -> ApiResult<()> {
        set_once(&mut self.paging, paging, ContextSlot::Paging)
    }

    /// Headers merged into the final response, whatever its status.
    #[must_use]
    pub const fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Mutable access to the headers merged into the final response.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Takes the accumulated response headers.
    pub fn take_response_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.response_headers)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, which: ContextSlot) -> ApiResult<()> {
    if slot.is_some() {
        return Err(ApiError::ContextSlotAlreadySet(which));
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_slots_report_missing() {
        let ctx = RequestContext::new(Method::GET);
        assert!(matches!(
            ctx.token(),
            Err(ApiError::MissingInContext(ContextSlot::Token))
        ));
        assert!(matches!(
            ctx.claims(),
            Err(ApiError::MissingInContext(ContextSlot::Claims))
        ));
        assert!(matches!(
            ctx.user_id(),
            Err(ApiError::MissingInContext(ContextSlot::UserId))
        ));
        assert!(matches!(
            ctx.entity_id(),
            Err(ApiError::MissingInContext(ContextSlot::EntityId))
        ));
        assert!(matches!(
            ctx.tenant_id(),
            Err(ApiError::MissingInContext(ContextSlot::TenantId))
        ));
    }

    #[test]
    fn test_slots_are_write_once() {
        let mut ctx = RequestContext::new(Method::POST);
        let first = Uuid::new_v4();
        ctx.set_entity_id(first).unwrap();
        assert!(matches!(
            ctx.set_entity_id(Uuid::new_v4()),
            Err(ApiError::ContextSlotAlreadySet(ContextSlot::EntityId))
        ));
        assert_eq!(ctx.entity_id().unwrap(), first);

        ctx.set_token("abc").unwrap();
        assert!(ctx.set_token("def").is_err());
        assert_eq!(ctx.token().unwrap(), "abc");
    }

    #[test]
    fn test_request_id_propagation() {
        let id = Uuid::now_v7();
        let request = http::Request::builder()
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(())
            .unwrap();
        assert_eq!(*RequestContext::for_request(&request).request_id().as_uuid(), id);

        let request = http::Request::builder()
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert_ne!(
            RequestContext::for_request(&request).request_id().as_uuid().to_string(),
            "not-a-uuid"
        );
    }

    #[test]
    fn test_data_context_snapshot() {
        let mut ctx = RequestContext::new(Method::GET);
        let tenant = Uuid::new_v4();
        ctx.set_tenant_id(tenant).unwrap();
        let data = ctx.data_context();
        assert_eq!(data.tenant_id().unwrap(), tenant);
        assert_eq!(data.request_id(), ctx.request_id());
        assert!(data.user_id().is_err());

        ctx.cancellation().cancel();
        assert!(data.cancellation().is_cancelled());
    }

    #[test]
    fn test_head_detection() {
        assert!(RequestContext::new(Method::HEAD).is_head());
        assert!(!RequestContext::new(Method::GET).is_head());
    }
}
