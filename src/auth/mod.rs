//! Authentication collaborators.
//!
//! Hashing and token handling sit behind traits so tests and alternative
//! deployments can swap them. The middleware resolves a bearer token into
//! the acting user before any protected handler runs.

mod jwt;
mod middleware;
mod password;

use thiserror::Error;

use crate::models::{User, UserId};

pub use jwt::JwtTokens;
pub use middleware::{require_auth, AuthUser};
pub use password::BcryptHasher;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    MissingCredentials(&'static str),

    #[error("Invalid token")]
    InvalidToken,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` on a mismatch; `Err` only when the hash is unreadable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

pub trait TokenService: Send + Sync {
    fn issue(&self, user: &User) -> Result<String, AuthError>;

    /// Returns the subject of a valid, unexpired token.
    fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}
