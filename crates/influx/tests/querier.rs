//! Integration tests for the measurement querier over in-memory and
//! failing sources.

use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use sensorgate_core::measurement::{Measurement, MeasurementKind, MeasurementValue};
use sensorgate_core::record::{FieldValue, RawRecord, SENSOR_MAC_TAG};
use sensorgate_core::types::Timestamp;
use sensorgate_influx::{
    MeasurementProvider, MemorySeries, Querier, RecordSource, SeriesQuery, Shape, SourceError,
    Span,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SENSOR: &str = "AA:BB:CC:DD:EE:FF";

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn sample(field: &str, value: FieldValue, time: Timestamp) -> RawRecord {
    RawRecord::new(field, value, time)
        .with_tag(SENSOR_MAC_TAG, SENSOR)
        .with_tag("_measurement", "ruuvi")
}

fn querier(records: Vec<RawRecord>) -> Querier<MemorySeries> {
    Querier::new(MemorySeries::with_records(records), "sensors", "ruuvi")
}

/// A source that always fails.
struct Unreachable;

#[async_trait]
impl RecordSource for Unreachable {
    async fn fetch(&self, _query: &SeriesQuery) -> Result<Vec<RawRecord>, SourceError> {
        Err(SourceError::Api {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Query construction
// ---------------------------------------------------------------------------

#[test]
fn test_latest_query_shape() {
    let q = querier(Vec::new()).latest_query(MeasurementKind::BatteryVoltage, SENSOR);
    assert_eq!(q.bucket, "sensors");
    assert_eq!(q.measurement, "ruuvi");
    assert_eq!(q.sensor_id, SENSOR);
    assert_eq!(q.field, "batteryvoltage");
    assert_eq!(q.span, Span::Last(Duration::from_secs(86_400)));
    assert_eq!(q.shape, Shape::Latest);
}

#[test]
fn test_range_query_keeps_bounds() {
    let stop = t0() + ChronoDuration::hours(2);
    let q = querier(Vec::new()).range_query(
        MeasurementKind::Co2,
        SENSOR,
        t0(),
        stop,
        Duration::from_secs(600),
    );
    assert_eq!(q.span, Span::Between { start: t0(), stop });
    assert_eq!(q.shape, Shape::WindowMean(Duration::from_secs(600)));
}

// ---------------------------------------------------------------------------
// Latest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_latest_returns_newest_sample() {
    let now = Utc::now();
    let q = querier(vec![
        sample("temperature", FieldValue::Float64(19.5), now - ChronoDuration::hours(2)),
        sample("temperature", FieldValue::Float64(21.25), now - ChronoDuration::minutes(5)),
    ]);

    let m = q.latest(MeasurementKind::Temperature, SENSOR).await.unwrap();
    assert_eq!(m.kind(), MeasurementKind::Temperature);
    assert_eq!(m.sensor_id(), SENSOR);
    assert_eq!(m.value(), MeasurementValue::Real(21.25));
}

#[tokio::test]
async fn test_latest_ignores_samples_older_than_a_day() {
    let q = querier(vec![sample(
        "humidity",
        FieldValue::Float64(40.0),
        Utc::now() - ChronoDuration::hours(25),
    )]);
    assert!(q.latest(MeasurementKind::Humidity, SENSOR).await.is_none());
}

#[tokio::test]
async fn test_latest_with_undecodable_value_is_none() {
    let q = querier(vec![sample(
        "temperature",
        FieldValue::Int64(21),
        Utc::now() - ChronoDuration::minutes(1),
    )]);
    assert!(q.latest(MeasurementKind::Temperature, SENSOR).await.is_none());
}

#[tokio::test]
async fn test_latest_pressure_widens_integer() {
    let q = querier(vec![sample(
        "pressure",
        FieldValue::Int32(101_325),
        Utc::now() - ChronoDuration::minutes(1),
    )]);
    let m = q.latest(MeasurementKind::Pressure, SENSOR).await.unwrap();
    assert_matches!(m, Measurement::Pressure { pressure: 101_325, .. });
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_range_means_over_populated_windows() {
    let q = querier(vec![
        sample("temperature", FieldValue::Float64(20.0), t0() + ChronoDuration::minutes(5)),
        sample("temperature", FieldValue::Float64(21.0), t0() + ChronoDuration::minutes(35)),
        sample("temperature", FieldValue::Float64(22.0), t0() + ChronoDuration::minutes(45)),
    ]);

    let out = q
        .range(
            MeasurementKind::Temperature,
            SENSOR,
            t0(),
            t0() + ChronoDuration::hours(2),
            Duration::from_secs(1800),
        )
        .await;

    let summary: Vec<_> = out.iter().map(|m| (m.value(), m.time())).collect();
    assert_eq!(
        summary,
        vec![
            (MeasurementValue::Real(20.0), t0() + ChronoDuration::minutes(30)),
            (MeasurementValue::Real(21.5), t0() + ChronoDuration::minutes(60)),
        ]
    );
}

#[tokio::test]
async fn test_range_truncates_integer_means() {
    let q = querier(vec![
        sample("co2", FieldValue::Int64(400), t0() + ChronoDuration::minutes(1)),
        sample("co2", FieldValue::Int64(401), t0() + ChronoDuration::minutes(2)),
    ]);

    let out = q
        .range(
            MeasurementKind::Co2,
            SENSOR,
            t0(),
            t0() + ChronoDuration::hours(1),
            Duration::from_secs(3600),
        )
        .await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].value(), MeasurementValue::Integer(400));
}

#[tokio::test]
async fn test_range_outside_data_is_empty() {
    let q = querier(vec![sample(
        "temperature",
        FieldValue::Float64(20.0),
        t0() + ChronoDuration::minutes(5),
    )]);

    let out = q
        .range(
            MeasurementKind::Temperature,
            SENSOR,
            t0() + ChronoDuration::days(1),
            t0() + ChronoDuration::days(2),
            Duration::from_secs(1800),
        )
        .await;
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_range_drops_rows_without_sensor_tag() {
    struct Untagged;

    #[async_trait]
    impl RecordSource for Untagged {
        async fn fetch(&self, _query: &SeriesQuery) -> Result<Vec<RawRecord>, SourceError> {
            Ok(vec![
                RawRecord::new("humidity", FieldValue::Float64(50.0), t0())
                    .with_tag(SENSOR_MAC_TAG, ""),
                sample("humidity", FieldValue::Float64(51.0), t0()),
            ])
        }
    }

    let q = Querier::new(Untagged, "sensors", "ruuvi");
    let out = q
        .range(
            MeasurementKind::Humidity,
            SENSOR,
            t0(),
            t0() + ChronoDuration::hours(1),
            Duration::from_secs(1800),
        )
        .await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].value(), MeasurementValue::Real(51.0));
}

// ---------------------------------------------------------------------------
// Source failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_source_failure_yields_empty_results() {
    let q = Querier::new(Unreachable, "sensors", "ruuvi");

    assert!(q.latest(MeasurementKind::Temperature, SENSOR).await.is_none());
    let out = q
        .range(
            MeasurementKind::Temperature,
            SENSOR,
            t0(),
            t0() + ChronoDuration::hours(1),
            Duration::from_secs(1800),
        )
        .await;
    assert!(out.is_empty());
}
