//! Integration tests for `AuthService` over a migrated SQLite database.

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use sensorgate_api::auth::{AuthError, AuthService};
use sensorgate_core::types::Timestamp;
use sensorgate_db::StoreError;
use sqlx::SqlitePool;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

fn service(pool: SqlitePool) -> AuthService {
    AuthService::new(pool).unwrap()
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_authorise_checks_password(pool: SqlitePool) {
    let auth = service(pool);
    auth.create_user("alice", "s3cret").await.unwrap();

    assert!(auth.authorise("alice", "s3cret").await);
    assert!(!auth.authorise("alice", "S3cret").await);
    assert!(!auth.authorise("alice", "").await);
    assert!(!auth.authorise("bob", "s3cret").await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stored_hash_is_argon2id(pool: SqlitePool) {
    let auth = service(pool);
    auth.create_user("alice", "s3cret").await.unwrap();

    let hash = auth.credentials().lookup_hash("alice").await.unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(!hash.contains("s3cret"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password_replaces_old(pool: SqlitePool) {
    let auth = service(pool);
    auth.create_user("alice", "old").await.unwrap();

    auth.change_password("alice", "new").await.unwrap();

    assert!(auth.authorise("alice", "new").await);
    assert!(!auth.authorise("alice", "old").await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password_of_unknown_user_fails(pool: SqlitePool) {
    let auth = service(pool);

    let result = auth.change_password("ghost", "pw").await;
    assert_matches!(result, Err(AuthError::Store(StoreError::NotFound)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_user_is_rejected(pool: SqlitePool) {
    let auth = service(pool);
    auth.create_user("alice", "one").await.unwrap();

    let result = auth.create_user("alice", "two").await;
    assert_matches!(result, Err(AuthError::Store(StoreError::AlreadyExists)));
    assert!(auth.authorise("alice", "one").await);
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_zero_duration_means_default_lifetime(pool: SqlitePool) {
    let auth = service(pool);
    let token = auth.issue_token_at(Duration::ZERO, t0()).await.unwrap();

    assert_eq!(token.valid_to - token.valid_from, ChronoDuration::days(28));
    assert!(auth.validate_token_at(&token.token, t0()).await);
    assert!(
        auth.validate_token_at(&token.token, t0() + ChronoDuration::days(14))
            .await
    );
    assert!(
        !auth
            .validate_token_at(&token.token, t0() + ChronoDuration::days(28))
            .await
    );
    assert!(
        !auth
            .validate_token_at(&token.token, t0() - ChronoDuration::seconds(1))
            .await
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_explicit_duration_is_honoured(pool: SqlitePool) {
    let auth = service(pool);
    let token = auth
        .issue_token_at(Duration::from_secs(3600), t0())
        .await
        .unwrap();

    assert_eq!(token.valid_to, t0() + ChronoDuration::hours(1));
    assert!(
        auth.validate_token_at(&token.token, t0() + ChronoDuration::minutes(59))
            .await
    );
    assert!(
        !auth
            .validate_token_at(&token.token, t0() + ChronoDuration::hours(1))
            .await
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_issued_tokens_are_distinct_uuids(pool: SqlitePool) {
    let auth = service(pool);
    let a = auth.issue_token(Duration::ZERO).await.unwrap();
    let b = auth.issue_token(Duration::ZERO).await.unwrap();

    assert_ne!(a.token, b.token);
    assert!(uuid::Uuid::parse_str(&a.token).is_ok());
    assert!(auth.validate_token(&a.token).await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revoke_token(pool: SqlitePool) {
    let auth = service(pool);
    let token = auth.issue_token(Duration::ZERO).await.unwrap().token;

    assert!(auth.revoke_token(&token).await.unwrap());
    assert!(!auth.validate_token(&token).await);

    // Unknown tokens report false rather than failing.
    assert!(!auth.revoke_token("no-such-token").await.unwrap());
}
