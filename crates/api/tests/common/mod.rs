#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use sensorgate_api::auth::AuthService;
use sensorgate_api::config::ServerConfig;
use sensorgate_api::router::build_app_router;
use sensorgate_api::state::AppState;
use sensorgate_core::record::RawRecord;
use sensorgate_influx::{MemorySeries, Querier};

/// Bucket and measurement names used by the in-memory series.
pub const BUCKET: &str = "sensors";
pub const MEASUREMENT: &str = "ruuvi";

/// Origin allowed by the test CORS policy.
pub const ORIGIN: &str = "http://localhost:5173";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![ORIGIN.to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: "sqlite::memory:".to_string(),
        influxdb_config: "influxdb.json".to_string(),
        static_dir: None,
    }
}

/// Build the auth service the test app runs on.
pub fn test_auth(pool: SqlitePool) -> Arc<AuthService> {
    Arc::new(AuthService::new(pool).expect("dummy hash"))
}

/// Build the full application router over `pool` with no measurements.
pub fn build_test_app(pool: SqlitePool) -> Router {
    build_test_app_with(pool, Vec::new()).0
}

/// Build the full application router, seeding the in-memory series with
/// `records`. Returns the auth service too so tests can create users and
/// tokens directly.
pub fn build_test_app_with(pool: SqlitePool, records: Vec<RawRecord>) -> (Router, Arc<AuthService>) {
    let config = test_config();
    let auth = test_auth(pool.clone());
    let series = MemorySeries::with_records(records);

    let state = AppState {
        pool,
        auth: Arc::clone(&auth),
        measurements: Arc::new(Querier::new(series, BUCKET, MEASUREMENT)),
    };

    (build_app_router(state, &config), auth)
}

/// Issue a fresh default-lifetime token.
pub async fn issue_token(auth: &AuthService) -> String {
    auth.issue_token(Duration::ZERO)
        .await
        .expect("issue token")
        .token
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Read the response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// GET with an `X-API-KEY` header.
pub async fn get_with_key(app: Router, uri: &str, key: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("X-API-KEY", key)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

/// POST an arbitrary body labelled as JSON.
pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
