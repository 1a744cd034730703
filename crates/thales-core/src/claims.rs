//! Verified token claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// Claim name carrying the caller's user identifier.
pub const DEFAULT_USER_CLAIM: &str = "user_uuid";

/// Claim name carrying the caller's tenant identifier.
pub const DEFAULT_TENANT_CLAIM: &str = "tenant_uuid";

/// Mapping from claim name to value, produced from a verified token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Wraps a claim map.
    #[must_use]
    pub const fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Returns the raw value of a claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a string claim.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns a claim parsed as a UUID.
    #[must_use]
    pub fn get_uuid(&self, name: &str) -> Option<Uuid> {
        self.get_str(name).and_then(|raw| Uuid::parse_str(raw).ok())
    }

    /// Returns a UUID claim, or `missing` when it is absent or malformed.
    pub fn require_uuid(&self, name: &str, missing: ApiError) -> Result<Uuid, ApiError> {
        self.get_uuid(name).ok_or(missing)
    }

    /// Whether the claim is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the token carried no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over claim names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}
