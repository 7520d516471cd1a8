//! Rendering [`SeriesQuery`] as Flux.

use std::fmt::Write as _;

use chrono::SecondsFormat;
use sensorgate_core::record::SENSOR_MAC_TAG;
use sensorgate_core::types::Timestamp;

use crate::query::{SeriesQuery, Shape, Span};

/// Render a query as a Flux script.
pub fn render(query: &SeriesQuery) -> String {
    let mut flux = format!("from(bucket: {})", string_literal(&query.bucket));

    match query.span {
        Span::Last(lookback) => {
            let _ = write!(flux, "\n  |> range(start: -{}s)", lookback.as_secs());
        }
        Span::Between { start, stop } => {
            let _ = write!(
                flux,
                "\n  |> range(start: {}, stop: {})",
                time_literal(start),
                time_literal(stop)
            );
        }
    }

    for (column, value) in [
        (SENSOR_MAC_TAG, &query.sensor_id),
        ("_measurement", &query.measurement),
        ("_field", &query.field),
    ] {
        let _ = write!(
            flux,
            "\n  |> filter(fn: (r) => r[{}] == {})",
            string_literal(column),
            string_literal(value)
        );
    }

    match query.shape {
        Shape::Latest => flux.push_str("\n  |> last()"),
        Shape::WindowMean(every) => {
            let _ = write!(
                flux,
                "\n  |> aggregateWindow(every: {}s, fn: mean, createEmpty: false)\n  |> yield(name: \"mean\")",
                every.as_secs()
            );
        }
    }

    flux
}

/// Quote and escape a Flux string literal.
///
/// Backslashes, double quotes and the `${` interpolation opener are escaped.
pub fn string_literal(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${");
    format!("\"{escaped}\"")
}

fn time_literal(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
