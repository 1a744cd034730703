//! Request identity, cancellation scopes and the context handed to data
//! functions.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::select_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use crate::claims::Claims;
use crate::error::{ApiError, ContextSlot};

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request
/// adjacent when sorted.
///
/// # Example
///
/// ```
/// use thales_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID, e.g. one propagated
    /// in an inbound header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Cooperative cancellation scope.
///
/// A scope is cancelled when [`cancel`](Self::cancel) is called on it or
/// on any ancestor it was derived from, or when its deadline passes.
/// Cancelling a child never affects its parent.
///
/// # Example
///
/// ```
/// use thales_core::Cancellation;
///
/// let request = Cancellation::new();
/// let fetch = request.child();
/// request.cancel();
/// assert!(fetch.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct Cancellation {
    own: Arc<watch::Sender<bool>>,
    watched: Vec<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Creates a root scope with no deadline.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            own: Arc::new(tx),
            watched: vec![rx],
            deadline: None,
        }
    }

    /// Derives a sub-scope that inherits this scope's signals and deadline.
    #[must_use]
    pub fn child(&self) -> Self {
        let (tx, rx) = watch::channel(false);
        let mut watched = self.watched.clone();
        watched.push(rx);
        Self {
            own: Arc::new(tx),
            watched,
            deadline: self.deadline,
        }
    }

    /// Tightens the deadline to at most `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        self
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this scope and every scope derived from it.
    pub fn cancel(&self) {
        self.own.send_replace(true);
    }

    /// Whether this scope has been cancelled or has expired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.watched.iter().any(|rx| *rx.borrow())
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Completes once the scope is cancelled or expires.
    pub async fn cancelled(&self) {
        let signals = self.watched.iter().cloned().map(|mut rx| {
            Box::pin(async move {
                let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                if !fired {
                    // Sender gone without cancelling: this signal never fires.
                    std::future::pending::<()>().await;
                }
            })
        });
        let any_signal = select_all(signals);
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = any_signal => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => {
                any_signal.await;
            }
        }
    }

    /// Drives `fut` until it completes or the scope is cancelled.
    ///
    /// Returns `None` when cancellation won.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            () = self.cancelled() => None,
            output = fut => Some(output),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the request handed to data functions.
///
/// Carries a child cancellation scope; data functions are expected to
/// abandon work once [`Cancellation::is_cancelled`] reports true.
#[derive(Debug, Clone)]
pub struct DataContext {
    request_id: RequestId,
    cancellation: Cancellation,
    claims: Option<Arc<Claims>>,
    user_id: Option<Uuid>,
    tenant_id: Option<Uuid>,
}

impl DataContext {
    /// Creates a data context.
    #[must_use]
    pub fn new(request_id: RequestId, cancellation: Cancellation) -> Self {
        Self {
            request_id,
            cancellation,
            claims: None,
            user_id: None,
            tenant_id: None,
        }
    }

    /// Attaches verified claims.
    #[must_use]
    pub fn with_claims(mut self, claims: Option<Arc<Claims>>) -> Self {
        self.claims = claims;
        self
    }

    /// Attaches the caller's user identifier.
    #[must_use]
    pub fn with_user_id(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Attaches the tenant scope.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: Option<Uuid>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the cancellation scope for this call.
    #[must_use]
    pub const fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Returns the verified claims, if the pipeline authenticated.
    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_deref()
    }

    /// Returns the caller's user identifier.
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        self.user_id
            .ok_or(ApiError::MissingInContext(ContextSlot::UserId))
    }

    /// Returns the tenant scope; only set on scoped pipelines.
    pub fn tenant_id(&self) -> Result<Uuid, ApiError> {
        self.tenant_id
            .ok_or(ApiError::MissingInContext(ContextSlot::TenantId))
    }
}
