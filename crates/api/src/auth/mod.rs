//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`service`] -- the [`AuthService`] façade over the credential and token
//!   stores.

pub mod password;
pub mod service;

pub use service::AuthService;

use sensorgate_db::StoreError;

/// Errors from the authentication service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The password hashing primitive failed.
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A blocking hashing task panicked or was cancelled.
    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::Hash(err.to_string())
    }
}
