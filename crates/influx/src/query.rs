//! Structured time-series queries.

use std::time::Duration;

use sensorgate_core::types::Timestamp;

/// Time range of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    /// From `now - duration` up to now.
    Last(Duration),
    /// `[start, stop)`.
    Between { start: Timestamp, stop: Timestamp },
}

/// What to do with the matching samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Only the most recent sample.
    Latest,
    /// Mean per window of the given width. Windows without samples are
    /// omitted.
    WindowMean(Duration),
}

/// A query for one field of one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub bucket: String,
    /// The `_measurement` value to match.
    pub measurement: String,
    /// The `sensormac` tag to match.
    pub sensor_id: String,
    /// The `_field` value to match.
    pub field: String,
    pub span: Span,
    pub shape: Shape,
}
