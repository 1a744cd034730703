//! # Thales Auth
//!
//! Identity and claims verification for the Thales pipeline.
//!
//! - [`bearer_token`] reads `Authorization: Bearer <token>`, keeping a
//!   missing header (401) distinct from a malformed one (400).
//! - [`validate_token_by_set`] verifies a token against every key in a
//!   [`KeySet`] and returns its [`Claims`](thales_core::Claims).
//! - [`KeySet::load_from_dir`] and [`fetch_key_set`] load keys;
//!   [`SharedKeySet`] lets them be swapped while requests are in flight.
//!
//! # Example
//!
//! ```rust,no_run
//! use thales_auth::{bearer_token, KeySet, TokenVerifier};
//!
//! # async fn example(headers: http::HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
//! let keys = KeySet::load_from_dir("/etc/thales/keys").await?;
//! let verifier = TokenVerifier::new(keys);
//!
//! let token = bearer_token(&headers)?;
//! let claims = verifier.verify(token)?;
//! println!("caller: {:?}", claims.get_str("sub"));
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/thales-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bearer;
pub mod error;
mod keyset;
pub mod remote;
mod verifier;

pub use bearer::bearer_token;
pub use error::{AuthError, AuthResult};
pub use keyset::{KeySet, SharedKeySet};
pub use remote::fetch_key_set;
pub use verifier::{validate_token_by_set, validate_token_with, TokenVerifier, VerifierOptions};
