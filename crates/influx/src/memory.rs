//! In-memory time-series source.
//!
//! Evaluates [`SeriesQuery`] over samples held in a vector, with the same
//! windowing rules as Flux `aggregateWindow`: windows are aligned to the
//! Unix epoch, clipped to the query range, stamped with their stop time,
//! and omitted when empty.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sensorgate_core::record::{FieldValue, RawRecord, SENSOR_MAC_TAG};
use sensorgate_core::types::Timestamp;

use crate::query::{SeriesQuery, Shape, Span};
use crate::{RecordSource, SourceError};

#[derive(Debug, Default)]
pub struct MemorySeries {
    samples: RwLock<Vec<RawRecord>>,
}

impl MemorySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = RawRecord>) -> Self {
        Self {
            samples: RwLock::new(records.into_iter().collect()),
        }
    }

    pub fn push(&self, record: RawRecord) {
        self.samples
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    pub fn len(&self) -> usize {
        self.samples
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate a query against the stored samples at instant `now`.
    pub fn evaluate(&self, query: &SeriesQuery, now: Timestamp) -> Vec<RawRecord> {
        let (start, stop) = match query.span {
            Span::Last(lookback) => {
                let start = ChronoDuration::from_std(lookback)
                    .ok()
                    .and_then(|lookback| now.checked_sub_signed(lookback))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                (start, now)
            }
            Span::Between { start, stop } => (start, stop),
        };

        let mut matching: Vec<RawRecord> = {
            let samples = self
                .samples
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            samples
                .iter()
                .filter(|r| r.time >= start && r.time < stop)
                .filter(|r| r.field == query.field)
                .filter(|r| tag_is(r, SENSOR_MAC_TAG, &query.sensor_id))
                .filter(|r| tag_is(r, "_measurement", &query.measurement))
                .cloned()
                .collect()
        };
        matching.sort_by_key(|r| r.time);

        match query.shape {
            Shape::Latest => matching.pop().into_iter().collect(),
            Shape::WindowMean(every) => window_means(&matching, every.as_secs().max(1), stop),
        }
    }
}

#[async_trait]
impl RecordSource for MemorySeries {
    async fn fetch(&self, query: &SeriesQuery) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.evaluate(query, Utc::now()))
    }
}

fn tag_is(record: &RawRecord, key: &str, expected: &str) -> bool {
    record.tag(key).and_then(FieldValue::as_str) == Some(expected)
}

/// Mean per epoch-aligned window. `sorted` must be ordered by time.
fn window_means(sorted: &[RawRecord], every_secs: u64, range_stop: Timestamp) -> Vec<RawRecord> {
    let every = i64::try_from(every_secs).unwrap_or(i64::MAX);
    let mut out = Vec::new();
    let mut current: Option<(i64, &RawRecord, f64, u32)> = None;

    for record in sorted {
        let Some(value) = numeric(&record.value) else {
            continue;
        };
        let window = record.time.timestamp().div_euclid(every);

        if let Some((w, _, sum, count)) = current.as_mut() {
            if *w == window {
                *sum += value;
                *count += 1;
                continue;
            }
        }
        if let Some(done) = current.replace((window, record, value, 1)) {
            out.push(window_record(done, every, range_stop));
        }
    }
    if let Some(done) = current {
        out.push(window_record(done, every, range_stop));
    }

    out
}

fn window_record(
    (window, first, sum, count): (i64, &RawRecord, f64, u32),
    every: i64,
    range_stop: Timestamp,
) -> RawRecord {
    let window_stop = window
        .checked_add(1)
        .and_then(|w| w.checked_mul(every))
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(range_stop);

    RawRecord {
        field: first.field.clone(),
        value: FieldValue::Float64(sum / f64::from(count)),
        tags: first.tags.clone(),
        time: window_stop.min(range_stop),
    }
}

fn numeric(value: &FieldValue) -> Option<f64> {
    match *value {
        FieldValue::Int8(v) => Some(f64::from(v)),
        FieldValue::Int16(v) => Some(f64::from(v)),
        FieldValue::Int32(v) => Some(f64::from(v)),
        FieldValue::Int64(v) => Some(v as f64),
        FieldValue::UInt8(v) => Some(f64::from(v)),
        FieldValue::UInt16(v) => Some(f64::from(v)),
        FieldValue::UInt32(v) => Some(f64::from(v)),
        FieldValue::UInt64(v) => Some(v as f64),
        FieldValue::Float32(v) => Some(f64::from(v)),
        FieldValue::Float64(v) => Some(v),
        FieldValue::Null | FieldValue::Bool(_) | FieldValue::String(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn sample(field: &str, value: impl Into<FieldValue>, minutes: i64) -> RawRecord {
        RawRecord::new(field, value.into(), t0() + ChronoDuration::minutes(minutes))
            .with_tag(SENSOR_MAC_TAG, "AA:BB")
            .with_tag("_measurement", "ruuvi")
    }

    fn query(field: &str, span: Span, shape: Shape) -> SeriesQuery {
        SeriesQuery {
            bucket: "sensors".into(),
            measurement: "ruuvi".into(),
            sensor_id: "AA:BB".into(),
            field: field.into(),
            span,
            shape,
        }
    }

    fn two_hours() -> Span {
        Span::Between {
            start: t0(),
            stop: t0() + ChronoDuration::hours(2),
        }
    }

    #[test]
    fn latest_picks_newest_matching_sample() {
        let series = MemorySeries::with_records([
            sample("temperature", 20.0, 10),
            sample("temperature", 22.0, 50),
            sample("temperature", 21.0, 30),
            sample("humidity", 40.0, 55),
        ]);

        let out = series.evaluate(&query("temperature", two_hours(), Shape::Latest), t0());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, FieldValue::Float64(22.0));
    }

    #[test]
    fn filters_on_sensor_and_measurement() {
        let series = MemorySeries::new();
        series.push(sample("temperature", 20.0, 10).with_tag(SENSOR_MAC_TAG, "other"));
        series.push(sample("temperature", 20.0, 10).with_tag("_measurement", "other"));
        assert_eq!(series.len(), 2);

        let out = series.evaluate(&query("temperature", two_hours(), Shape::Latest), t0());
        assert!(out.is_empty());
    }

    #[test]
    fn range_is_closed_open() {
        let series = MemorySeries::with_records([
            sample("temperature", 1.0, 0),
            sample("temperature", 2.0, 120),
        ]);

        let out = series.evaluate(
            &query(
                "temperature",
                two_hours(),
                Shape::WindowMean(Duration::from_secs(3600)),
            ),
            t0(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, FieldValue::Float64(1.0));
    }

    #[test]
    fn window_means_skip_empty_windows() {
        let series = MemorySeries::with_records([
            sample("temperature", 20.0, 5),
            sample("temperature", 21.0, 35),
            sample("temperature", 22.0, 45),
        ]);

        let out = series.evaluate(
            &query(
                "temperature",
                two_hours(),
                Shape::WindowMean(Duration::from_secs(1800)),
            ),
            t0(),
        );

        let summary: Vec<_> = out.iter().map(|r| (r.value.clone(), r.time)).collect();
        assert_eq!(
            summary,
            vec![
                (FieldValue::Float64(20.0), t0() + ChronoDuration::minutes(30)),
                (FieldValue::Float64(21.5), t0() + ChronoDuration::minutes(60)),
            ]
        );
        assert_eq!(out[0].sensor_mac(), Some("AA:BB"));
    }

    #[test]
    fn last_window_is_clipped_to_range_stop() {
        let series = MemorySeries::with_records([sample("pressure", 100_000_i64, 100)]);
        let stop = t0() + ChronoDuration::minutes(110);

        let out = series.evaluate(
            &query(
                "pressure",
                Span::Between { start: t0(), stop },
                Shape::WindowMean(Duration::from_secs(3600)),
            ),
            t0(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time, stop);
        assert_eq!(out[0].value, FieldValue::Float64(100_000.0));
    }

    #[test]
    fn lookback_is_relative_to_now() {
        let series = MemorySeries::with_records([
            sample("temperature", 1.0, 0),
            sample("temperature", 2.0, 60 * 30),
        ]);
        let now = t0() + ChronoDuration::hours(31);

        let out = series.evaluate(
            &query(
                "temperature",
                Span::Last(Duration::from_secs(24 * 3600)),
                Shape::Latest,
            ),
            now,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, FieldValue::Float64(2.0));

        let stale = series.evaluate(
            &query(
                "temperature",
                Span::Last(Duration::from_secs(1800)),
                Shape::Latest,
            ),
            now,
        );
        assert!(stale.is_empty());
    }
}
