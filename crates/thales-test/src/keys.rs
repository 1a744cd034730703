//! Symmetric signing keys for tests.
//!
//! [`TestKeys`] holds one or more HS256 secrets, exposes them as a
//! [`KeySet`] of `oct` JWKs and mints tokens the pipeline will accept.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};
use thales_auth::{KeySet, TokenVerifier};
use thales_core::{DEFAULT_TENANT_CLAIM, DEFAULT_USER_CLAIM};
use uuid::Uuid;

use crate::error::TestError;

const DEFAULT_KID: &str = "test";
const FOREIGN_SECRET: &[u8] = b"thales-test-foreign-secret";

/// Signing keys shared by a test and the verifier under test.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use thales_test::TestKeys;
///
/// let keys = TestKeys::new();
/// let token = keys.token(&json!({"sub": "alice"}));
/// let claims = keys.verifier().verify(&token).unwrap();
/// assert_eq!(claims.get_str("sub"), Some("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct TestKeys {
    secrets: Vec<(String, Vec<u8>)>,
}

impl Default for TestKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl TestKeys {
    /// One key with kid `test`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kids(&[DEFAULT_KID])
    }

    /// One key per kid, each with its own secret.
    #[must_use]
    pub fn with_kids(kids: &[&str]) -> Self {
        let secrets = kids
            .iter()
            .map(|kid| ((*kid).to_string(), format!("thales-test-secret-{kid}").into_bytes()))
            .collect();
        Self { secrets }
    }

    /// The keys as `oct` JWKs.
    #[must_use]
    pub fn key_set(&self) -> KeySet {
        let keys: Vec<Value> = self
            .secrets
            .iter()
            .map(|(kid, secret)| {
                json!({
                    "kty": "oct",
                    "kid": kid,
                    "alg": "HS256",
                    "k": URL_SAFE_NO_PAD.encode(secret),
                })
            })
            .collect();
        KeySet::from_json(&json!({ "keys": keys }).to_string())
            .expect("oct JWKs built from test secrets parse")
    }

    /// A verifier over [`key_set`](Self::key_set).
    #[must_use]
    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(self.key_set())
    }

    /// Signs `claims` with the first key.
    ///
    /// An `exp` one hour ahead is added unless `claims` carries one.
    ///
    /// # Panics
    ///
    /// Panics if `claims` is not a JSON object.
    #[must_use]
    pub fn token(&self, claims: &Value) -> String {
        let (kid, _) = &self.secrets[0];
        self.token_with_kid(kid, claims)
            .expect("first test key signs")
    }

    /// Signs `claims` with the key named `kid`.
    pub fn token_with_kid(&self, kid: &str, claims: &Value) -> Result<String, TestError> {
        let secret = self
            .secrets
            .iter()
            .find(|(name, _)| name == kid)
            .map(|(_, secret)| secret.as_slice())
            .ok_or_else(|| TestError::RequestBuild(format!("unknown kid {kid:?}")))?;
        sign(Some(kid), secret, claims)
    }

    /// Signs `claims` with a secret that is not in the set, reusing the
    /// first kid so the verifier tries the matching key and rejects it.
    ///
    /// # Panics
    ///
    /// Panics if `claims` is not a JSON object.
    #[must_use]
    pub fn foreign_token(&self, claims: &Value) -> String {
        let (kid, _) = &self.secrets[0];
        sign(Some(kid), FOREIGN_SECRET, claims).expect("foreign test key signs")
    }

    /// Signs claims carrying `user_uuid` and `tenant_uuid`.
    #[must_use]
    pub fn user_token(&self, user_id: Uuid, tenant_id: Uuid) -> String {
        self.token(&user_claims(user_id, tenant_id))
    }
}

/// Claims naming a user and a tenant under the default claim names.
#[must_use]
pub fn user_claims(user_id: Uuid, tenant_id: Uuid) -> Value {
    let mut claims = Map::new();
    claims.insert(DEFAULT_USER_CLAIM.to_string(), json!(user_id));
    claims.insert(DEFAULT_TENANT_CLAIM.to_string(), json!(tenant_id));
    Value::Object(claims)
}

fn sign(kid: Option<&str>, secret: &[u8], claims: &Value) -> Result<String, TestError> {
    let mut claims: Map<String, Value> = match claims {
        Value::Object(map) => map.clone(),
        other => {
            return Err(TestError::RequestBuild(format!(
                "claims must be a JSON object, got {other}"
            )))
        }
    };
    claims
        .entry("exp")
        .or_insert_with(|| json!((Utc::now() + Duration::hours(1)).timestamp()));

    let mut header = Header::new(Algorithm::HS256);
    header.kid = kid.map(str::to_string);
    Ok(encode(&header, &claims, &EncodingKey::from_secret(secret))?)
}
