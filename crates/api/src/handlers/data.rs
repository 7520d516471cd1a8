//! Handlers for the `/data` resource (latest sample, windowed history).

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use sensorgate_core::error::CoreError;
use sensorgate_core::measurement::{Measurement, MeasurementKind};
use sensorgate_core::types::Timestamp;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKey;
use crate::state::AppState;

/// Window width used when `interval` is omitted.
pub const DEFAULT_INTERVAL_SECS: u64 = 1800;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for the range endpoint. Kept as strings so that every
/// malformed value gets the same 400 envelope.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub interval: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/data/{field}/{id}/latest
pub async fn latest(
    _key: ApiKey,
    State(state): State<AppState>,
    Path((field, id)): Path<(String, String)>,
) -> AppResult<Json<Measurement>> {
    let kind = parse_kind(&field)?;
    let id = parse_sensor_id(&id)?;

    state
        .measurements
        .latest(kind, id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(kind, id))
}

/// GET /api/data/{field}/{id}/range?from=&to=&interval=
pub async fn range(
    _key: ApiKey,
    State(state): State<AppState>,
    Path((field, id)): Path<(String, String)>,
    Query(params): Query<RangeParams>,
) -> AppResult<Json<Vec<Measurement>>> {
    let kind = parse_kind(&field)?;
    let id = parse_sensor_id(&id)?;

    let start = parse_instant("from", params.from.as_deref())?;
    let stop = parse_instant("to", params.to.as_deref())?;
    if start >= stop {
        return Err(AppError::BadRequest("'from' must be earlier than 'to'".into()));
    }
    let interval = parse_interval(params.interval.as_deref())?;

    let measurements = state
        .measurements
        .range(kind, id, start, stop, interval)
        .await;

    if measurements.is_empty() {
        return Err(not_found(kind, id));
    }
    Ok(Json(measurements))
}

/// Any other path under `/api/data`. Authenticated first so that unknown
/// shapes never leak past the token check.
pub async fn malformed(_key: ApiKey, Path(rest): Path<String>) -> AppResult<()> {
    Err(AppError::BadRequest(format!(
        "Malformed data path {rest:?}, expected /{{field}}/{{id}}/latest or /{{field}}/{{id}}/range"
    )))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_kind(field: &str) -> AppResult<MeasurementKind> {
    field
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown measurement field: {field:?}")))
}

fn parse_sensor_id(id: &str) -> AppResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::BadRequest("Sensor id must not be empty".into()));
    }
    Ok(id)
}

fn parse_instant(name: &str, raw: Option<&str>) -> AppResult<Timestamp> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{name}' parameter")))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::BadRequest(format!("Invalid '{name}' timestamp {raw:?}: {e}")))
}

fn parse_interval(raw: Option<&str>) -> AppResult<Duration> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(Duration::from_secs(DEFAULT_INTERVAL_SECS));
    };

    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::BadRequest(format!(
            "'interval' must be a positive number of seconds, got {raw:?}"
        ))),
    }
}

fn not_found(kind: MeasurementKind, id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "measurement",
        key: format!("{kind}/{id}"),
    })
}
