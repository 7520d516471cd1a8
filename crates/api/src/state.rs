use std::sync::Arc;

use sensorgate_influx::MeasurementProvider;

use crate::auth::AuthService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Credential and token database pool.
    pub pool: sensorgate_db::DbPool,
    /// Password checks and token lifecycle.
    pub auth: Arc<AuthService>,
    /// Time-series measurement lookups.
    pub measurements: Arc<dyn MeasurementProvider>,
}
