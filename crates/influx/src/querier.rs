//! Measurement queries: build a [`SeriesQuery`], run it, decode the rows.

use std::time::Duration;

use async_trait::async_trait;
use sensorgate_core::decode::decode;
use sensorgate_core::measurement::{Measurement, MeasurementKind};
use sensorgate_core::record::RawRecord;
use sensorgate_core::types::Timestamp;

use crate::query::{SeriesQuery, Shape, Span};
use crate::RecordSource;

/// How far back `latest` looks for a sample.
pub const LATEST_LOOKBACK: Duration = Duration::from_secs(24 * 60 * 60);

/// Measurement lookups as used by the HTTP handlers.
#[async_trait]
pub trait MeasurementProvider: Send + Sync {
    /// The most recent sample within [`LATEST_LOOKBACK`], if any decodes.
    async fn latest(&self, kind: MeasurementKind, sensor_id: &str) -> Option<Measurement>;

    /// Windowed means over `[start, stop)`, one per non-empty window of
    /// width `interval`. Rows that fail to decode are dropped.
    async fn range(
        &self,
        kind: MeasurementKind,
        sensor_id: &str,
        start: Timestamp,
        stop: Timestamp,
        interval: Duration,
    ) -> Vec<Measurement>;
}

/// Runs measurement queries against one bucket and measurement category.
pub struct Querier<S> {
    source: S,
    bucket: String,
    measurement: String,
}

impl<S: RecordSource> Querier<S> {
    pub fn new(source: S, bucket: impl Into<String>, measurement: impl Into<String>) -> Self {
        Self {
            source,
            bucket: bucket.into(),
            measurement: measurement.into(),
        }
    }

    pub fn latest_query(&self, kind: MeasurementKind, sensor_id: &str) -> SeriesQuery {
        self.query(kind, sensor_id, Span::Last(LATEST_LOOKBACK), Shape::Latest)
    }

    /// Intervals below one second are raised to one second.
    pub fn range_query(
        &self,
        kind: MeasurementKind,
        sensor_id: &str,
        start: Timestamp,
        stop: Timestamp,
        interval: Duration,
    ) -> SeriesQuery {
        self.query(
            kind,
            sensor_id,
            Span::Between { start, stop },
            Shape::WindowMean(interval.max(Duration::from_secs(1))),
        )
    }

    fn query(&self, kind: MeasurementKind, sensor_id: &str, span: Span, shape: Shape) -> SeriesQuery {
        SeriesQuery {
            bucket: self.bucket.clone(),
            measurement: self.measurement.clone(),
            sensor_id: sensor_id.to_string(),
            field: kind.field_name().to_string(),
            span,
            shape,
        }
    }

    /// Run a query; a failing source yields no rows.
    async fn run(&self, query: &SeriesQuery) -> Vec<RawRecord> {
        match self.source.fetch(query).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    field = %query.field,
                    sensor_id = %query.sensor_id,
                    "Time-series query failed"
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<S: RecordSource> MeasurementProvider for Querier<S> {
    async fn latest(&self, kind: MeasurementKind, sensor_id: &str) -> Option<Measurement> {
        let query = self.latest_query(kind, sensor_id);
        let records = self.run(&query).await;

        // `last()` yields one row per table; keep the newest.
        let record = records.iter().max_by_key(|r| r.time)?;
        match decode(record) {
            Ok(measurement) => Some(measurement),
            Err(e) => {
                tracing::warn!(error = %e, %kind, sensor_id, "Latest record did not decode");
                None
            }
        }
    }

    async fn range(
        &self,
        kind: MeasurementKind,
        sensor_id: &str,
        start: Timestamp,
        stop: Timestamp,
        interval: Duration,
    ) -> Vec<Measurement> {
        let query = self.range_query(kind, sensor_id, start, stop, interval);
        let records = self.run(&query).await;

        let total = records.len();
        let measurements: Vec<Measurement> =
            records.iter().filter_map(|r| decode(r).ok()).collect();

        let dropped = total - measurements.len();
        if dropped > 0 {
            tracing::warn!(dropped, total, %kind, sensor_id, "Dropped undecodable records");
        }

        measurements
    }
}
