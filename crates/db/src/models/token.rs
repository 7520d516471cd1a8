//! Bearer token model.
//!
//! Validity instants are stored as text in UTC with a 24-hour clock and
//! millisecond precision (`2024-01-01 13:04:05.123`). Instants are truncated
//! to the millisecond before they are written so that a read returns exactly
//! what was inserted.

use chrono::{NaiveDateTime, SubsecRound};
use sensorgate_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use crate::StoreError;

/// Write format for `validFrom` / `validTo`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Read format; accepts any number of fractional digits, including none.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Truncate an instant to the precision the store keeps.
pub fn truncate_to_storage(ts: Timestamp) -> Timestamp {
    ts.trunc_subsecs(3)
}

pub fn format_timestamp(ts: Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_PARSE_FORMAT).map(|naive| naive.and_utc())
}

/// A row from the `tokens` table, as stored.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub id: DbId,
    pub token: String,
    #[sqlx(rename = "validFrom")]
    pub valid_from: String,
    #[sqlx(rename = "validTo")]
    pub valid_to: String,
    pub revoked: i64,
}

/// A decoded token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: DbId,
    pub token: String,
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
    pub revoked: bool,
}

impl Token {
    /// The window is closed on the left and open on the right.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        !self.revoked && self.valid_from <= now && now < self.valid_to
    }
}

impl TryFrom<TokenRow> for Token {
    type Error = StoreError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let valid_from = parse_timestamp(&row.valid_from)
            .map_err(|e| StoreError::Corrupt(format!("validFrom {:?}: {e}", row.valid_from)))?;
        let valid_to = parse_timestamp(&row.valid_to)
            .map_err(|e| StoreError::Corrupt(format!("validTo {:?}: {e}", row.valid_to)))?;

        Ok(Token {
            id: row.id,
            token: row.token,
            valid_from,
            valid_to,
            revoked: row.revoked != 0,
        })
    }
}

/// DTO for inserting a token.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub token: String,
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
    pub revoked: bool,
}

impl NewToken {
    /// A non-revoked token valid for `[valid_from, valid_to)`.
    pub fn new(token: impl Into<String>, valid_from: Timestamp, valid_to: Timestamp) -> Self {
        Self {
            token: token.into(),
            valid_from,
            valid_to,
            revoked: false,
        }
    }
}
