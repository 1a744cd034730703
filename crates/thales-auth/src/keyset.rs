//! Verification key sets.
//!
//! A [`KeySet`] is an immutable list of JWKs. [`SharedKeySet`] is the
//! handle the pipeline reads from; an external collaborator may swap in a
//! new set while requests keep the snapshot they started with.

use std::path::Path;
use std::sync::Arc;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};

/// An immutable set of verification keys.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<Jwk>,
}

impl KeySet {
    /// Creates a key set.
    #[must_use]
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Parses either a JWK set (`{"keys": [...]}`) or a single JWK.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> AuthResult<Self> {
        if value.get("keys").is_some() {
            let set: JwkSet =
                serde_json::from_value(value).map_err(|e| AuthError::KeyParse(e.to_string()))?;
            Ok(Self::new(set.keys))
        } else {
            let jwk: Jwk =
                serde_json::from_value(value).map_err(|e| AuthError::KeyParse(e.to_string()))?;
            Ok(Self::new(vec![jwk]))
        }
    }

    /// Returns the keys in load order.
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Returns the key with the given `kid`.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Appends every key of `other`.
    pub fn extend(&mut self, other: Self) {
        self.keys.extend(other.keys);
    }

    /// Loads every `*.json` file in `dir`, in file-name order.
    ///
    /// Each file holds either a JWK set or a single JWK.
    pub async fn load_from_dir(dir: impl AsRef<Path>) -> AuthResult<Self> {
        let dir = dir.as_ref();
        info!(path = %dir.display(), "loading keys from directory");

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| AuthError::key_load(dir, format!("failed to read directory: {e}")))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AuthError::key_load(dir, format!("failed to read entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
                files.push(path);
            }
        }
        files.sort();

        let mut set = Self::default();
        for path in files {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| AuthError::key_load(&path, format!("failed to read file: {e}")))?;
            let loaded = Self::from_json(&content)
                .map_err(|e| AuthError::key_load(&path, e.to_string()))?;
            debug!(path = %path.display(), keys = loaded.len(), "loaded key file");
            set.extend(loaded);
        }

        info!(path = %dir.display(), keys = set.len(), "key set loaded");
        Ok(set)
    }
}

impl From<JwkSet> for KeySet {
    fn from(set: JwkSet) -> Self {
        Self::new(set.keys)
    }
}

/// Concurrently readable handle to the current key set.
///
/// Cloning the handle shares the underlying set.
///
/// # Example
///
/// ```
/// use thales_auth::{KeySet, SharedKeySet};
///
/// let shared = SharedKeySet::new(KeySet::default());
/// let before = shared.snapshot();
/// shared.replace(KeySet::from_json(r#"{"kty":"oct","k":"c2VjcmV0"}"#).unwrap());
/// assert!(before.is_empty());
/// assert_eq!(shared.snapshot().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedKeySet {
    inner: Arc<RwLock<Arc<KeySet>>>,
}

impl SharedKeySet {
    /// Wraps an initial key set.
    #[must_use]
    pub fn new(keys: KeySet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(keys))),
        }
    }

    /// Returns the current key set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<KeySet> {
        Arc::clone(&self.inner.read())
    }

    /// Swaps in a new key set for subsequent requests.
    pub fn replace(&self, keys: KeySet) {
        *self.inner.write() = Arc::new(keys);
    }
}

impl From<KeySet> for SharedKeySet {
    fn from(keys: KeySet) -> Self {
        Self::new(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OCT_A: &str = r#"{"kty":"oct","kid":"a","alg":"HS256","k":"c2VjcmV0LWE"}"#;
    const OCT_B: &str = r#"{"kty":"oct","kid":"b","alg":"HS256","k":"c2VjcmV0LWI"}"#;

    #[test]
    fn test_single_jwk() {
        let set = KeySet::from_json(OCT_A).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.find("a").is_some());
        assert!(set.find("b").is_none());
    }

    #[test]
    fn test_jwk_set() {
        let json = format!(r#"{{"keys":[{OCT_A},{OCT_B}]}}"#);
        let set = KeySet::from_json(&json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.keys()[1].common.key_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            KeySet::from_json(r#"{"kty":"nope"}"#),
            Err(AuthError::KeyParse(_))
        ));
        assert!(matches!(KeySet::from_json("not json"), Err(AuthError::Json(_))));
    }

    #[tokio::test]
    async fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), OCT_B).unwrap();
        std::fs::write(dir.path().join("a.json"), OCT_A).unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let set = KeySet::load_from_dir(dir.path()).await.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.keys()[0].common.key_id.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_load_from_dir_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let err = KeySet::load_from_dir(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[tokio::test]
    async fn test_load_from_missing_dir() {
        let err = KeySet::load_from_dir("/definitely/not/here").await.unwrap_err();
        assert!(matches!(err, AuthError::KeyLoad { .. }));
    }

    #[test]
    fn test_shared_key_set_snapshots() {
        let shared = SharedKeySet::new(KeySet::from_json(OCT_A).unwrap());
        let reader = shared.clone();
        let before = reader.snapshot();
        shared.replace(KeySet::default());
        assert_eq!(before.len(), 1);
        assert!(reader.snapshot().is_empty());
    }
}
