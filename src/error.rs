//! Error types for the listing backend
//!
//! `AppError` is the taxonomy callers see; `CacheError` stays inside the
//! cache layer and is never promoted to an `AppError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::warn;

use crate::auth::AuthError;
use crate::models::{ErrorResponse, InvalidId};
use crate::store::StoreError;

// == App Error Enum ==
/// Errors surfaced to HTTP callers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed ID or request body; not retryable
    #[error("{0}")]
    InvalidInput(String),

    /// Entity absent or not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Missing or rejected credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Document store unreachable or timed out; caller may retry
    #[error("{0}")]
    Infrastructure(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        warn!(error = %err, "document store failure");
        AppError::Infrastructure(err.to_string())
    }
}

impl From<InvalidId> for AppError {
    fn from(err: InvalidId) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::MissingCredentials(_) => {
                AppError::Unauthorized(err.to_string())
            }
            AuthError::Hashing(_) | AuthError::Signing(_) => {
                warn!(error = %err, "authentication collaborator failure");
                AppError::Infrastructure(err.to_string())
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Infrastructure(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Cache Error Enum ==
/// Faults raised by a cache backend. Absorbed by `CacheHandle`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not present
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key present but past its TTL
    #[error("Key expired: {0}")]
    Expired(String),

    /// Key or value rejected by the backend
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend at capacity and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Backend could not be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

// == Result Type Alias ==
/// Convenience Result type for request-facing operations.
pub type Result<T> = std::result::Result<T, AppError>;
