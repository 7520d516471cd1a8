//! Scripted sessions against the admin menus.

use sensorgate_admin::console::Console;
use sensorgate_admin::{tokens, users};
use sensorgate_api::auth::AuthService;
use sqlx::SqlitePool;

/// Run the user menu over `script`, returning everything it printed.
async fn user_session(auth: &AuthService, script: &str) -> String {
    let mut console = Console::new(script.as_bytes(), Vec::new());
    users::run(auth, &mut console).await.unwrap();
    String::from_utf8(console.into_output()).unwrap()
}

async fn token_session(auth: &AuthService, script: &str) -> String {
    let mut console = Console::new(script.as_bytes(), Vec::new());
    tokens::run(auth, &mut console).await.unwrap();
    String::from_utf8(console.into_output()).unwrap()
}

// ---------------------------------------------------------------------------
// user-admin
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_check_and_list(pool: SqlitePool) {
    let auth = AuthService::new(pool).unwrap();

    let output = user_session(
        &auth,
        "c\nalice\nhunter2hunter2\nhunter2hunter2\n\
         p\nalice\nhunter2hunter2\n\
         p\nalice\nwrong\n\
         l\nq\n",
    )
    .await;

    assert!(output.contains("Created user alice"));
    assert!(output.contains("Password is correct"));
    assert!(output.contains("Password is incorrect"));
    assert!(output.contains("  alice"));
    assert!(auth.authorise("alice", "hunter2hunter2").await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_rejects_short_and_mismatched_passwords(pool: SqlitePool) {
    let auth = AuthService::new(pool).unwrap();

    let output = user_session(
        &auth,
        "create\nbob\nshort\n\
         create\nbob\nlongenough1\nlongenough2\n\
         list\nexit\n",
    )
    .await;

    assert!(output.contains("at least 8 characters"));
    assert!(output.contains("Passwords do not match"));
    assert!(output.contains("No users"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_update_and_remove(pool: SqlitePool) {
    let auth = AuthService::new(pool).unwrap();
    auth.create_user("carol", "original-pw").await.unwrap();

    let output = user_session(
        &auth,
        "c\ncarol\nanother-pw\nanother-pw\n\
         u\ncarol\nreplaced-pw\nreplaced-pw\n\
         u\nnobody\nreplaced-pw\nreplaced-pw\n\
         r\ncarol\n\
         r\ncarol\n",
    )
    .await;

    assert!(output.contains("User carol already exists"));
    assert!(output.contains("Updated password for carol"));
    assert!(output.contains("No such user nobody"));
    assert!(output.contains("Removed user carol"));
    assert!(output.contains("No such user carol"));
    assert!(!auth.authorise("carol", "replaced-pw").await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_command_and_end_of_input(pool: SqlitePool) {
    let auth = AuthService::new(pool).unwrap();

    // Input ends in the middle of a command; the session still ends cleanly.
    let output = user_session(&auth, "frobnicate\nc\n").await;

    assert!(output.contains("Unknown command \"frobnicate\""));
    assert!(auth.credentials().list_usernames().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// token-admin
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_create_validate_revoke(pool: SqlitePool) {
    let auth = AuthService::new(pool).unwrap();

    let output = token_session(&auth, "c\n72h\nq\n").await;
    let token = output
        .lines()
        .find_map(|line| line.split("Token: ").nth(1))
        .expect("token printed")
        .trim()
        .to_string();
    assert!(output.contains("Valid until: "));
    assert!(auth.validate_token(&token).await);

    let output = token_session(&auth, &format!("v\n{token}\nr\n{token}\nv\n{token}\n")).await;
    assert!(output.contains("Token is valid"));
    assert!(output.contains("Token revoked"));
    assert!(output.contains("Token is not valid"));
    assert!(output.contains("(revoked)"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_bad_duration_and_unknown_token(pool: SqlitePool) {
    let auth = AuthService::new(pool).unwrap();

    let output = token_session(&auth, "c\nfortnight\nr\nno-such-token\nq\n").await;

    assert!(output.contains("Invalid duration \"fortnight\""));
    assert!(output.contains("No such token"));

    let output = token_session(&auth, "v\nno-such-token\n").await;
    assert!(output.contains("Token is not valid"));
    assert!(output.contains("unknown token"));
}
