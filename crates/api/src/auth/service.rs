//! Authentication façade: password checks and bearer token lifecycle.

use std::time::Duration;

use chrono::Utc;
use sensorgate_core::types::Timestamp;
use sensorgate_db::models::credential::Credential;
use sensorgate_db::models::token::{NewToken, Token};
use sensorgate_db::repositories::{CredentialRepo, TokenRepo};
use sensorgate_db::{DbPool, StoreError};
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::AuthError;

/// Token lifetime used when a caller asks for a zero duration.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(28 * 24 * 60 * 60);

/// Plaintext of the hash verified when the user does not exist.
const DUMMY_PASSWORD: &str = "sensorgate-dummy-password";

/// Shared behind an `Arc`; every method is safe to call concurrently.
pub struct AuthService {
    credentials: CredentialRepo,
    tokens: TokenRepo,
    /// Verified against for unknown users so both paths cost one hash.
    dummy_hash: String,
}

impl AuthService {
    /// Build the service over `pool`. Computes the dummy hash, so this costs
    /// one password hash.
    pub fn new(pool: DbPool) -> Result<Self, AuthError> {
        Self::from_repos(CredentialRepo::new(pool.clone()), TokenRepo::new(pool))
    }

    pub fn from_repos(credentials: CredentialRepo, tokens: TokenRepo) -> Result<Self, AuthError> {
        Ok(Self {
            credentials,
            tokens,
            dummy_hash: hash_password(DUMMY_PASSWORD)?,
        })
    }

    pub fn credentials(&self) -> &CredentialRepo {
        &self.credentials
    }

    pub fn tokens(&self) -> &TokenRepo {
        &self.tokens
    }

    // ---- passwords ----

    /// Whether `password` is correct for `username`.
    ///
    /// Unknown users and storage failures answer `false`. Both the unknown
    /// and the known-user path run exactly one verification.
    pub async fn authorise(&self, username: &str, password: &str) -> bool {
        let stored = match self.credentials.lookup_hash(username).await {
            Ok(hash) => Some(hash),
            Err(StoreError::NotFound) => None,
            Err(e) => {
                tracing::error!(error = %e, "Credential lookup failed");
                None
            }
        };

        let known = stored.is_some();
        let hash = stored.unwrap_or_else(|| self.dummy_hash.clone());
        let password = password.to_string();

        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await;

        match verified {
            Ok(Ok(matches)) => known && matches,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, username, "Stored password hash is malformed");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// Hash `password` off the async runtime.
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
        Ok(hash)
    }

    /// Create a user with a freshly hashed password.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        let hash = self.hash(password).await?;
        Ok(self.credentials.insert_user(username, &hash).await?)
    }

    /// Replace a user's password.
    pub async fn change_password(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let hash = self.hash(password).await?;
        Ok(self.credentials.update_password(username, &hash).await?)
    }

    // ---- tokens ----

    /// Issue a token valid from now for `duration` (zero means
    /// [`DEFAULT_TOKEN_LIFETIME`]).
    pub async fn issue_token(&self, duration: Duration) -> Result<Token, AuthError> {
        self.issue_token_at(duration, Utc::now()).await
    }

    /// Issue a token valid from `now` for `duration`.
    pub async fn issue_token_at(&self, duration: Duration, now: Timestamp) -> Result<Token, AuthError> {
        let lifetime = if duration.is_zero() {
            DEFAULT_TOKEN_LIFETIME
        } else {
            duration
        };
        let lifetime = chrono::Duration::from_std(lifetime).map_err(|_| {
            StoreError::InvalidInput(format!("token lifetime too long: {lifetime:?}"))
        })?;
        let valid_to = now.checked_add_signed(lifetime).ok_or_else(|| {
            StoreError::InvalidInput(format!("token lifetime too long: {lifetime}"))
        })?;

        let input = NewToken::new(Uuid::new_v4().to_string(), now, valid_to);
        let token = self.tokens.insert(&input).await?;

        tracing::info!(valid_to = %token.valid_to, "Issued token");
        Ok(token)
    }

    pub async fn validate_token(&self, token: &str) -> bool {
        self.tokens.is_valid(token).await
    }

    pub async fn validate_token_at(&self, token: &str, now: Timestamp) -> bool {
        self.tokens.is_valid_at(token, now).await
    }

    /// Revoke `token`. Returns whether it existed.
    pub async fn revoke_token(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.tokens.revoke(token).await?)
    }
}
