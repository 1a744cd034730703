//! Turning a loaded [`ThalesConfig`] into running parts.

use std::sync::Arc;

use http::header::HeaderValue;
use thales_auth::{fetch_key_set, AuthError, KeySet, TokenVerifier};
use thales_config::{AuthConfig, ConfigError, ThalesConfig};
use thales_crud::{EndpointOptions, EndpointOptionsBuilder};
use thales_middleware::DefaultResponder;
use thales_telemetry::TelemetryError;
use thiserror::Error;
use tracing::info;

/// Errors raised while starting a service from configuration.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Keys could not be loaded.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Neither `auth.key_dir` nor `auth.jwks_url` is set.
    #[error("no key source configured: set auth.key_dir or auth.jwks_url")]
    NoKeySource,

    /// `cache.cache_control` is not a valid header value.
    #[error("invalid cache.cache_control: {0}")]
    InvalidCacheControl(String),
}

/// Loads the verification keys named by `config`.
///
/// Keys from `key_dir` and `jwks_url` are combined when both are set.
///
/// # Errors
///
/// Returns [`BootstrapError::NoKeySource`] if no source is configured,
/// or the first loading failure.
pub async fn load_verifier(config: &AuthConfig) -> Result<TokenVerifier, BootstrapError> {
    if config.key_dir.is_none() && config.jwks_url.is_none() {
        return Err(BootstrapError::NoKeySource);
    }

    let mut keys = KeySet::default();
    if let Some(dir) = &config.key_dir {
        keys.extend(KeySet::load_from_dir(dir).await?);
    }
    if let Some(url) = &config.jwks_url {
        keys.extend(fetch_key_set(url).await?);
    }

    info!(keys = keys.len(), "token verifier ready");
    Ok(TokenVerifier::new(keys))
}

/// Starts an [`EndpointOptionsBuilder`] carrying the configured claims,
/// paging bounds, cache policy and responder settings.
///
/// # Errors
///
/// Returns [`BootstrapError::InvalidCacheControl`] if the cache policy
/// cannot be sent as a header.
pub fn endpoint_options(
    config: &ThalesConfig,
    verifier: TokenVerifier,
) -> Result<EndpointOptionsBuilder, BootstrapError> {
    let cache_control = HeaderValue::from_str(&config.cache.cache_control)
        .map_err(|e| BootstrapError::InvalidCacheControl(e.to_string()))?;
    let responder = DefaultResponder::new()
        .with_realm(config.auth.realm.clone())
        .log_internal_causes(config.errors.log_internal_causes);

    let mut builder = EndpointOptions::builder(verifier)
        .responder(Arc::new(responder))
        .user_claim(config.auth.user_claim.clone())
        .paging(config.paging_options())
        .cache_control(cache_control);
    if let Some(claim) = &config.auth.tenant_claim {
        builder = builder.tenant_claim(claim.clone());
    }
    Ok(builder)
}

/// Installs telemetry, loads keys and returns endpoint options.
///
/// # Errors
///
/// Returns the first failure of [`thales_telemetry::init_telemetry`],
/// [`load_verifier`] or [`endpoint_options`].
pub async fn bootstrap(config: &ThalesConfig) -> Result<EndpointOptions, BootstrapError> {
    thales_telemetry::init_telemetry(&config.telemetry_config())?;
    let verifier = load_verifier(&config.auth).await?;
    Ok(endpoint_options(config, verifier)?.build())
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use http::StatusCode;
    use serde_json::json;
    use thales_config::{CacheConfig, PagingConfig};
    use thales_crud::{fetch_fn, get, Fetched};
    use thales_middleware::{entity_id_fn, last_modified_fn};
    use thales_test::{TestKeys, TestRequest, TestResponse};
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_no_key_source() {
        let err = load_verifier(&AuthConfig::default()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::NoKeySource));
    }

    #[tokio::test]
    async fn test_load_verifier_from_key_dir() {
        let dir = tempfile::tempdir().unwrap();
        let jwk = json!({
            "kty": "oct",
            "kid": "test",
            "alg": "HS256",
            "k": URL_SAFE_NO_PAD.encode(b"thales-test-secret-test"),
        });
        std::fs::write(dir.path().join("signing.json"), jwk.to_string()).unwrap();

        let config = AuthConfig {
            key_dir: Some(dir.path().display().to_string()),
            ..AuthConfig::default()
        };
        let verifier = load_verifier(&config).await.unwrap();

        let keys = TestKeys::new();
        let claims = verifier.verify(&keys.user_token(Uuid::new_v4(), Uuid::new_v4()));
        assert!(claims.is_ok());
    }

    #[tokio::test]
    async fn test_missing_key_dir() {
        let config = AuthConfig {
            key_dir: Some("/definitely/not/here".to_string()),
            ..AuthConfig::default()
        };
        let err = load_verifier(&config).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Auth(AuthError::KeyLoad { .. })));
    }

    #[test]
    fn test_endpoint_options_from_config() {
        let config = ThalesConfig::builder()
            .auth(AuthConfig {
                tenant_claim: Some("org_uuid".to_string()),
                user_claim: "sub".to_string(),
                ..AuthConfig::default()
            })
            .paging(PagingConfig {
                default_limit: 10,
                max_limit: 20,
            })
            .cache(CacheConfig {
                cache_control: "private, max-age=0".to_string(),
            })
            .build();

        let options = endpoint_options(&config, TestKeys::new().verifier())
            .unwrap()
            .build();
        assert_eq!(options.tenant_claim(), Some("org_uuid"));
        assert_eq!(options.user_claim(), "sub");
        assert_eq!(options.paging().max_limit, 20);
        assert_eq!(options.cache_control(), "private, max-age=0");
    }

    #[test]
    fn test_invalid_cache_control() {
        let mut config = ThalesConfig::default();
        config.cache.cache_control = "bad\nvalue".to_string();
        let err = endpoint_options(&config, TestKeys::new().verifier()).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidCacheControl(_)));
    }

    #[tokio::test]
    async fn test_configured_realm_reaches_challenge() {
        let mut config = ThalesConfig::default();
        config.auth.realm = "things".to_string();
        let options = endpoint_options(&config, TestKeys::new().verifier())
            .unwrap()
            .build();

        let endpoint = get(
            "things.get",
            &options,
            entity_id_fn(|_| Ok(Uuid::nil())),
            last_modified_fn(|_, _| async { Ok(chrono::Utc::now()) }),
            fetch_fn(|_, _| async { Ok(Fetched::Value(json!({}))) }),
        );

        let response = endpoint.handle(TestRequest::get("/things/x").build()).await;
        let response = TestResponse::from_http(response).await.unwrap();
        response
            .assert_status(StatusCode::UNAUTHORIZED)
            .assert_header("www-authenticate", "Bearer realm=\"things\"");
    }
}
