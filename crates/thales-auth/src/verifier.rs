//! Token verification against a key set.
//!
//! Every key in the set is tried. A key that rejects the token (bad
//! signature, wrong algorithm family, a declared `alg` other than the
//! token's, unusable key material, failed claim checks) only eliminates
//! itself; [`ApiError::TokenValidationFailed`] is
//! reported once every key has been tried. A token that is structurally
//! invalid fails immediately with [`ApiError::TokenMalformed`].

use std::collections::HashSet;

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use thales_core::{ApiError, Claims};
use tracing::debug;

use crate::keyset::{KeySet, SharedKeySet};

/// Claim checks applied after a signature verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierOptions {
    /// Allowed clock skew in seconds for `exp` and `nbf`.
    pub leeway: u64,
    /// Accepted audiences; `None` skips the `aud` check.
    pub audience: Option<Vec<String>>,
    /// Accepted issuers; `None` skips the `iss` check.
    pub issuer: Option<Vec<String>>,
    /// Claims that must be present.
    pub required_claims: Vec<String>,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            leeway: 0,
            audience: None,
            issuer: None,
            required_claims: Vec::new(),
        }
    }
}

impl VerifierOptions {
    fn validation_for(&self, header: &Header) -> Validation {
        let mut validation = Validation::new(header.alg);
        validation.leeway = self.leeway;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.required_spec_claims = self.required_claims.iter().cloned().collect::<HashSet<_>>();
        match &self.audience {
            Some(audience) => validation.set_audience(audience),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(issuer);
        }
        validation
    }
}

/// Verifies `token` against every key in `keys` with default options.
///
/// # Example
///
/// ```
/// use thales_auth::{validate_token_by_set, KeySet};
/// use thales_core::ApiError;
///
/// let keys = KeySet::default();
/// assert!(matches!(
///     validate_token_by_set("not-a-token", &keys),
///     Err(ApiError::TokenMalformed(_))
/// ));
/// ```
pub fn validate_token_by_set(token: &str, keys: &KeySet) -> Result<Claims, ApiError> {
    validate_token_with(token, keys, &VerifierOptions::default())
}

/// Verifies `token` against every key in `keys`.
pub fn validate_token_with(
    token: &str,
    keys: &KeySet,
    options: &VerifierOptions,
) -> Result<Claims, ApiError> {
    let header = decode_header(token).map_err(|e| ApiError::TokenMalformed(e.to_string()))?;
    let validation = options.validation_for(&header);

    for jwk in keys.keys() {
        let kid = jwk.common.key_id.as_deref();
        if let (Some(wanted), Some(kid)) = (header.kid.as_deref(), kid) {
            if wanted != kid {
                continue;
            }
        }
        if !alg_permits(jwk, header.alg) {
            debug!(kid, alg = ?header.alg, "key declares a different alg");
            continue;
        }
        let key = match DecodingKey::from_jwk(jwk) {
            Ok(key) => key,
            Err(err) => {
                debug!(kid, error = %err, "skipping unusable key");
                continue;
            }
        };
        match decode::<Claims>(token, &key, &validation) {
            Ok(data) => return Ok(data.claims),
            Err(err) if is_structural(&err) => {
                return Err(ApiError::TokenMalformed(err.to_string()));
            }
            Err(err) => {
                debug!(kid, error = %err, "key rejected token");
            }
        }
    }

    Err(ApiError::TokenValidationFailed)
}

/// A key without `alg` accepts any algorithm of its family.
fn alg_permits(jwk: &Jwk, alg: Algorithm) -> bool {
    jwk.common
        .key_algorithm
        .map_or(true, |declared| format!("{declared:?}") == format!("{alg:?}"))
}

fn is_structural(err: &JwtError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_)
    )
}

/// Verifier bound to a shared key set and a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct TokenVerifier {
    keys: SharedKeySet,
    options: VerifierOptions,
}

impl TokenVerifier {
    /// Creates a verifier with default options.
    #[must_use]
    pub fn new(keys: impl Into<SharedKeySet>) -> Self {
        Self {
            keys: keys.into(),
            options: VerifierOptions::default(),
        }
    }

    /// Replaces the claim-check options.
    #[must_use]
    pub fn with_options(mut self, options: VerifierOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the shared key set handle.
    #[must_use]
    pub const fn keys(&self) -> &SharedKeySet {
        &self.keys
    }

    /// Verifies a token against the current key set snapshot.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let keys = self.keys.snapshot();
        validate_token_with(token, &keys, &self.options)
    }
}
