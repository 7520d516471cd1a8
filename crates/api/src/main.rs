use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensorgate_api::auth::AuthService;
use sensorgate_api::config::ServerConfig;
use sensorgate_api::router::build_app_router;
use sensorgate_api::state::AppState;
use sensorgate_influx::{InfluxClient, InfluxConfig, MeasurementProvider, MemorySeries, Querier};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensorgate_api=debug,sensorgate_influx=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = sensorgate_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open auth database");
    tracing::info!(url = %config.database_url, "Database connection pool created");

    sensorgate_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    sensorgate_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Services ---
    let auth = AuthService::new(pool.clone()).expect("Failed to initialise auth service");
    let measurements = build_measurement_provider(&config.influxdb_config);

    // --- App state ---
    let state = AppState {
        pool,
        auth: Arc::new(auth),
        measurements,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .await
    });
    let abort = server.abort_handle();

    // Resolves on a signal, or early if the server exits on its own.
    let _ = signalled_rx.await;

    // --- Drain ---
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    match tokio::time::timeout(drain, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("Graceful shutdown complete"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => {
            tracing::warn!(
                drain_secs = config.shutdown_timeout_secs,
                "In-flight requests did not finish in time, aborting"
            );
            abort.abort();
        }
    }
}

/// Pick the time-series backend.
///
/// Uses InfluxDB when the config file exists; otherwise serves from an
/// empty in-memory series so the auth endpoints still work.
fn build_measurement_provider(config_path: &str) -> Arc<dyn MeasurementProvider> {
    if !Path::new(config_path).exists() {
        tracing::warn!(
            path = %config_path,
            "InfluxDB config not found, serving measurements from an empty in-memory series"
        );
        return Arc::new(Querier::new(MemorySeries::new(), "local", "local"));
    }

    let influx = InfluxConfig::from_file(config_path).expect("Failed to load InfluxDB config");
    tracing::info!(
        address = %influx.address,
        bucket = %influx.bucket,
        measurement = %influx.measurement,
        "Loaded InfluxDB configuration"
    );

    let client = InfluxClient::new(&influx);
    Arc::new(Querier::new(client, influx.bucket, influx.measurement))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
