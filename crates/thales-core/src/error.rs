//! Error types for Thales.
//!
//! This module provides [`ApiError`], the closed set of failures any
//! pipeline stage can produce, and [`ErrorEnvelope`], the structured body
//! the default responder writes for them.
//!
//! # Status mapping
//!
//! | Origin | Kinds | Status |
//! |---|---|---|
//! | credential | `MissingAuthHeader` | 401 |
//! | credential | `AuthHeaderWrongFormat`, `TokenMalformed`, `TokenValidationFailed` | 400 |
//! | claims | `ClaimsMissing`, `MissingUserUuid`, `MissingTenantUuid` | 400 |
//! | request shape | `InvalidOffset`, `InvalidLimit`, `InvalidEntityId`, `Marshalling` | 400 |
//! | validation | `Validation`, `NoChanges` | 400 |
//! | precondition | `UnmodifiedSinceHeaderMissing` | 428 |
//! | precondition | `UnmodifiedSinceHeaderInvalid` | 400 |
//! | not found | `NotFound`, `Data(NoRows)`, `Data(DoesNotExist)` | 404 |
//! | upstream | `FailedToReceiveMetadata`, `ErrorReceivingResults`, `Data(Other)` | 500 |
//! | internal | `MissingInContext`, `ContextSlotAlreadySet`, `Render`, `Cancelled` | 500 |

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DataError;
use crate::validation::ValidationWrapperError;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Origin groups for failures, used for log fields and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing, malformed or unverifiable bearer credential.
    Credential,
    /// A required claim is absent.
    Claims,
    /// Malformed body, paging parameter or entity identifier.
    RequestShape,
    /// DTO-reported semantic errors.
    Validation,
    /// Missing or invalid conditional-update header.
    Precondition,
    /// A data function signalled absence.
    NotFound,
    /// Any other data-function failure.
    Upstream,
    /// Pipeline misconfiguration or cancellation.
    Internal,
}

impl ErrorCategory {
    /// Returns the label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Claims => "claims",
            Self::RequestShape => "request_shape",
            Self::Validation => "validation",
            Self::Precondition => "precondition",
            Self::NotFound => "not_found",
            Self::Upstream => "upstream",
            Self::Internal => "internal",
        }
    }
}

/// The request-scoped slots a stage can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextSlot {
    /// Raw bearer token.
    Token,
    /// Verified claims.
    Claims,
    /// Caller user identifier.
    UserId,
    /// Identifier of the addressed entity.
    EntityId,
    /// Tenant scope identifier.
    TenantId,
    /// Parsed paging parameters.
    Paging,
}

impl fmt::Display for ContextSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Token => "auth token",
            Self::Claims => "claims",
            Self::UserId => "user uuid",
            Self::EntityId => "entity uuid",
            Self::TenantId => "tenant uuid",
            Self::Paging => "paging",
        })
    }
}

/// Every failure a pipeline stage can hand to the error responder.
///
/// # Example
///
/// ```
/// use thales_core::ApiError;
/// use http::StatusCode;
///
/// assert_eq!(ApiError::NoChanges.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(
///     ApiError::UnmodifiedSinceHeaderMissing.status_code(),
///     StatusCode::PRECONDITION_REQUIRED
/// );
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// No `Authorization` header was sent.
    #[error("authorization header is missing")]
    MissingAuthHeader,

    /// `Authorization` header is not of the form `Bearer <token>`.
    #[error("authorization header has wrong format, expected 'Bearer <token>'")]
    AuthHeaderWrongFormat,

    /// The token could not be parsed.
    #[error("token is malformed: {0}")]
    TokenMalformed(String),

    /// No key in the key set validates the token.
    #[error("token validation failed")]
    TokenValidationFailed,

    /// The verified token carries no claims.
    #[error("claims are missing")]
    ClaimsMissing,

    /// The user identifier claim is absent or not a UUID.
    #[error("user uuid is missing")]
    MissingUserUuid,

    /// The tenant identifier claim is absent or not a UUID.
    #[error("tenant uuid is missing")]
    MissingTenantUuid,

    /// A slot was read before the stage producing it ran.
    #[error("{0} is missing in request context")]
    MissingInContext(ContextSlot),

    /// A slot was written twice.
    #[error("{0} was already set in request context")]
    ContextSlotAlreadySet(ContextSlot),

    /// The `offset` query parameter is not a non-negative integer.
    #[error("invalid offset: {0}")]
    InvalidOffset(String),

    /// The `limit` query parameter is not a non-negative integer.
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// The entity identifier could not be extracted.
    #[error("invalid entity uuid: {0}")]
    InvalidEntityId(String),

    /// The request body could not be decoded.
    #[error("could not decode request body: {0}")]
    Marshalling(String),

    /// DTO validation reported one or more errors.
    #[error(transparent)]
    Validation(#[from] ValidationWrapperError),

    /// A patch DTO reported no modification.
    #[error("patch request did not contain any changes")]
    NoChanges,

    /// `If-Unmodified-Since` is required but absent.
    #[error("If-Unmodified-Since header is missing")]
    UnmodifiedSinceHeaderMissing,

    /// `If-Unmodified-Since` is present but not an HTTP date.
    #[error("If-Unmodified-Since header is invalid: {0}")]
    UnmodifiedSinceHeaderInvalid(String),

    /// The requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// A cache metadata function failed.
    #[error("failed to receive metadata")]
    FailedToReceiveMetadata,

    /// A terminal fetch function failed.
    #[error("error receiving results")]
    ErrorReceivingResults,

    /// The response body could not be rendered.
    #[error("failed to render response: {0}")]
    Render(String),

    /// The request scope was cancelled or its deadline passed.
    #[error("request was cancelled")]
    Cancelled,

    /// Error passed through from a create or patch function.
    #[error(transparent)]
    Data(#[from] DataError),
}

impl ApiError {
    /// Returns the origin group of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingAuthHeader
            | Self::AuthHeaderWrongFormat
            | Self::TokenMalformed(_)
            | Self::TokenValidationFailed => ErrorCategory::Credential,
            Self::ClaimsMissing | Self::MissingUserUuid | Self::MissingTenantUuid => {
                ErrorCategory::Claims
            }
            Self::InvalidOffset(_)
            | Self::InvalidLimit(_)
            | Self::InvalidEntityId(_)
            | Self::Marshalling(_) => ErrorCategory::RequestShape,
            Self::Validation(_) | Self::NoChanges => ErrorCategory::Validation,
            Self::UnmodifiedSinceHeaderMissing | Self::UnmodifiedSinceHeaderInvalid(_) => {
                ErrorCategory::Precondition
            }
            Self::NotFound => ErrorCategory::NotFound,
            Self::FailedToReceiveMetadata | Self::ErrorReceivingResults => ErrorCategory::Upstream,
            Self::MissingInContext(_)
            | Self::ContextSlotAlreadySet(_)
            | Self::Render(_)
            | Self::Cancelled => ErrorCategory::Internal,
            Self::Data(err) => match err.wrapped_api_error() {
                Some(inner) => inner.category(),
                None if err.is_not_found() => ErrorCategory::NotFound,
                None if err.wrapped_validation().is_some() => ErrorCategory::Validation,
                None => ErrorCategory::Upstream,
            },
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuthHeader => StatusCode::UNAUTHORIZED,
            Self::AuthHeaderWrongFormat
            | Self::TokenMalformed(_)
            | Self::TokenValidationFailed
            | Self::ClaimsMissing
            | Self::MissingUserUuid
            | Self::MissingTenantUuid
            | Self::InvalidOffset(_)
            | Self::InvalidLimit(_)
            | Self::InvalidEntityId(_)
            | Self::Marshalling(_)
            | Self::Validation(_)
            | Self::NoChanges
            | Self::UnmodifiedSinceHeaderInvalid(_) => StatusCode::BAD_REQUEST,
            Self::UnmodifiedSinceHeaderMissing => StatusCode::PRECONDITION_REQUIRED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::FailedToReceiveMetadata
            | Self::ErrorReceivingResults
            | Self::MissingInContext(_)
            | Self::ContextSlotAlreadySet(_)
            | Self::Render(_)
            | Self::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Data(err) => {
                if let Some(inner) = err.wrapped_api_error() {
                    inner.status_code()
                } else if err.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if err.wrapped_validation().is_some() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }

    /// Returns the human-readable error strings sent to the client.
    ///
    /// Validation aggregates are flattened into one string per underlying
    /// error. Unrecognized upstream errors are generalized so their cause
    /// is never echoed.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(wrapper) => wrapper.messages(),
            Self::Data(err) => {
                if let Some(inner) = err.wrapped_api_error() {
                    inner.messages()
                } else if let Some(wrapper) = err.wrapped_validation() {
                    wrapper.messages()
                } else if err.is_not_found() {
                    vec![Self::NotFound.to_string()]
                } else {
                    vec![Self::ErrorReceivingResults.to_string()]
                }
            }
            other => vec![other.to_string()],
        }
    }

    /// Whether this failure is reported to the client as a server fault.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Converts this error to the structured response body.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.status_code(), self.messages())
    }
}

/// Structured error body: status, status text and a flat list of messages.
///
/// ```json
/// {"status": 400, "status_text": "Bad Request", "errors": ["invalid limit: x"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Numeric HTTP status.
    pub status: u16,
    /// Canonical reason phrase for the status.
    pub status_text: String,
    /// Human-readable error strings, never empty.
    pub errors: Vec<String>,
}

impl ErrorEnvelope {
    /// Creates an envelope for `status`; an empty message list is replaced
    /// by the status text.
    #[must_use]
    pub fn new(status: StatusCode, errors: Vec<String>) -> Self {
        let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();
        let errors = if errors.is_empty() {
            vec![status_text.clone()]
        } else {
            errors
        };
        Self {
            status: status.as_u16(),
            status_text,
            errors,
        }
    }
}
