//! Repository for the `tokens` table.

use chrono::Utc;
use sensorgate_core::types::Timestamp;

use crate::models::token::{format_timestamp, truncate_to_storage, NewToken, Token, TokenRow};
use crate::{DbPool, StoreError};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, token, validFrom, validTo, revoked";

/// Bearer token store.
///
/// Rows are never deleted; only `revoked` changes after insertion.
#[derive(Debug, Clone)]
pub struct TokenRepo {
    pool: DbPool,
}

impl TokenRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a token, returning it as persisted (instants truncated to the
    /// millisecond).
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the token string is
    /// already present.
    pub async fn insert(&self, input: &NewToken) -> Result<Token, StoreError> {
        if input.token.is_empty() {
            return Err(StoreError::InvalidInput("token must not be empty".into()));
        }
        let valid_from = truncate_to_storage(input.valid_from);
        let valid_to = truncate_to_storage(input.valid_to);
        if valid_to <= valid_from {
            return Err(StoreError::InvalidInput(
                "validTo must be later than validFrom".into(),
            ));
        }

        let query = format!(
            "INSERT INTO tokens (token, validFrom, validTo, revoked)
             VALUES (?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, TokenRow>(&query)
            .bind(&input.token)
            .bind(format_timestamp(valid_from))
            .bind(format_timestamp(valid_to))
            .bind(i64::from(input.revoked))
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from_write)?;
        tx.commit().await?;

        Token::try_from(row)
    }

    /// Mark a token revoked, whatever its validity window.
    ///
    /// Idempotent. Returns `true` if the token exists.
    pub async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE tokens SET revoked = 1 WHERE token = ?")
            .bind(token)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Look a token up by its string.
    pub async fn find(&self, token: &str) -> Result<Option<Token>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM tokens WHERE token = ?");
        let row = sqlx::query_as::<_, TokenRow>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Token::try_from).transpose()
    }

    /// Whether `token` is usable right now.
    pub async fn is_valid(&self, token: &str) -> bool {
        self.is_valid_at(token, Utc::now()).await
    }

    /// Whether `token` exists, is not revoked and `now` lies in
    /// `[validFrom, validTo)`.
    ///
    /// Lookup and decoding failures count as invalid.
    pub async fn is_valid_at(&self, token: &str, now: Timestamp) -> bool {
        match self.find(token).await {
            Ok(Some(found)) => found.is_valid_at(now),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Token lookup failed, treating as invalid");
                false
            }
        }
    }
}
