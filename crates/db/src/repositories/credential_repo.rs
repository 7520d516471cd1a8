//! Repository for the `credentials` table.
//!
//! Stores password hashes only; callers hash before inserting.

use crate::models::credential::Credential;
use crate::{DbPool, StoreError};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, password";

/// Username → password hash store.
#[derive(Debug, Clone)]
pub struct CredentialRepo {
    pool: DbPool,
}

impl CredentialRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new credential, returning the created row.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the username is taken.
    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Credential, StoreError> {
        if username.is_empty() {
            return Err(StoreError::InvalidInput("username must not be empty".into()));
        }
        if password_hash.is_empty() {
            return Err(StoreError::InvalidInput(
                "password hash must not be empty".into(),
            ));
        }

        let query = format!(
            "INSERT INTO credentials (username, password)
             VALUES (?, ?)
             RETURNING {COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;
        let credential = sqlx::query_as::<_, Credential>(&query)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from_write)?;
        tx.commit().await?;

        Ok(credential)
    }

    /// Delete a credential. Returns `true` if a row was removed; removing an
    /// absent user is not an error.
    pub async fn remove_user(&self, username: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM credentials WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch the stored hash for `username` (case-sensitive).
    pub async fn lookup_hash(&self, username: &str) -> Result<String, StoreError> {
        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password FROM credentials WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        match hash {
            Some((hash,)) if !hash.is_empty() => Ok(hash),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Replace the hash for an existing user.
    pub async fn update_password(&self, username: &str, new_hash: &str) -> Result<(), StoreError> {
        if new_hash.is_empty() {
            return Err(StoreError::InvalidInput(
                "password hash must not be empty".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE credentials SET password = ? WHERE username = ?")
            .bind(new_hash)
            .bind(username)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;

        Ok(())
    }

    /// All usernames, alphabetically.
    pub async fn list_usernames(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT username FROM credentials ORDER BY username")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
