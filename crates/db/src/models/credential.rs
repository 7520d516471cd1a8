//! User credential model.

use sensorgate_core::types::DbId;
use sqlx::FromRow;

/// A row from the `credentials` table.
///
/// Holds the password hash -- never serialize this to API responses.
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub id: DbId,
    pub username: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}
