//! Remote JWK set retrieval.

use tracing::info;

use crate::error::{AuthError, AuthResult};
use crate::keyset::KeySet;

/// Fetches a JWK set document from `url`.
///
/// Rotation is the caller's concern: fetch periodically and hand the
/// result to [`SharedKeySet::replace`](crate::SharedKeySet::replace).
pub async fn fetch_key_set(url: &str) -> AuthResult<KeySet> {
    info!(url, "fetching remote key set");

    let response = reqwest::get(url)
        .await
        .map_err(|e| AuthError::Remote(format!("failed to fetch key set: {e}")))?;

    if !response.status().is_success() {
        return Err(AuthError::Remote(format!(
            "key set endpoint returned status {}: {url}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AuthError::Remote(format!("failed to read response: {e}")))?;

    let keys = KeySet::from_json(&body).map_err(|e| AuthError::Remote(e.to_string()))?;
    info!(url, keys = keys.len(), "remote key set loaded");
    Ok(keys)
}
