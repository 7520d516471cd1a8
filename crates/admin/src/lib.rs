//! Interactive administration of the credential and token stores.
//!
//! The menus are generic over their input and output so the binaries run
//! them on stdin/stdout and the tests on in-memory buffers.

pub mod console;
pub mod tokens;
pub mod users;

use anyhow::Context;
use sensorgate_api::auth::AuthService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Database used when `AUTH_DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://auth.db";

/// `AUTH_DATABASE_URL`, or [`DEFAULT_DATABASE_URL`].
pub fn database_url() -> String {
    std::env::var("AUTH_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into())
}

/// Log to stderr so the menu on stdout stays readable.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensorgate_admin=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Open the auth database, apply migrations and build the service.
pub async fn open_auth_service(database_url: &str) -> anyhow::Result<AuthService> {
    let pool = sensorgate_db::create_pool(database_url)
        .await
        .with_context(|| format!("Failed to open auth database {database_url}"))?;

    sensorgate_db::health_check(&pool)
        .await
        .context("Auth database health check failed")?;

    sensorgate_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!(url = %database_url, "Auth database ready");

    AuthService::new(pool).context("Failed to initialise auth service")
}
