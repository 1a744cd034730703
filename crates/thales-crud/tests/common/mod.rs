//! Shared fixtures for endpoint tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thales_core::{BoxError, Dto};
use thales_crud::{Endpoint, EndpointOptions};
use thales_middleware::Request;
use thales_test::{TestKeys, TestResponse};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewThing {
    pub name: String,
}

impl Dto for NewThing {
    fn validate(&self) -> Vec<BoxError> {
        let mut errors: Vec<BoxError> = Vec::new();
        if self.name.is_empty() {
            errors.push("name must not be empty".into());
        }
        if self.name.len() > 20 {
            errors.push("name is too long".into());
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct ThingPatch {
    pub name: Option<String>,
}

impl Dto for ThingPatch {
    fn validate(&self) -> Vec<BoxError> {
        match &self.name {
            Some(name) if name.is_empty() => vec!["name must not be empty".into()],
            _ => Vec::new(),
        }
    }

    fn has_changes(&self) -> bool {
        self.name.is_some()
    }
}

/// Counts calls to a data function.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Caller {
    pub keys: TestKeys,
    pub user: Uuid,
    pub tenant: Uuid,
}

impl Caller {
    pub fn new() -> Self {
        Self {
            keys: TestKeys::new(),
            user: Uuid::new_v4(),
            tenant: Uuid::new_v4(),
        }
    }

    pub fn token(&self) -> String {
        self.keys.user_token(self.user, self.tenant)
    }

    pub fn options(&self) -> EndpointOptions {
        EndpointOptions::builder(self.keys.verifier()).build()
    }

    pub fn scoped_options(&self) -> EndpointOptions {
        EndpointOptions::builder(self.keys.verifier())
            .tenant_scoped()
            .build()
    }
}

pub async fn send(endpoint: &Endpoint, request: Request) -> TestResponse {
    TestResponse::from_http(endpoint.handle(request).await)
        .await
        .expect("response body readable")
}
