//! Record to measurement conversion.
//!
//! The field name selects the variant and, with it, the accepted value
//! types:
//!
//! - real channels (temperature, humidity, battery voltage, PM2.5) accept
//!   only `f64`; anything else is a data-quality problem upstream and is
//!   rejected rather than cast.
//! - integer channels (pressure, CO2) accept every integer width and both
//!   real widths, since aggregated queries return means. Reals are
//!   truncated toward zero.
//!
//! [`decode`] is pure: same record in, same result out.

use crate::measurement::{Measurement, MeasurementKind};
use crate::record::{FieldValue, RawRecord};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty field")]
    EmptyField,

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("{0}: missing sensormac tag")]
    MissingSensorId(MeasurementKind),

    #[error("{kind}: cannot use {found} value")]
    TypeMismatch {
        kind: MeasurementKind,
        found: &'static str,
    },
}

/// Convert a raw record into a typed measurement.
pub fn decode(record: &RawRecord) -> Result<Measurement, DecodeError> {
    let kind: MeasurementKind = record.field.parse()?;

    let sensor_id = match record.sensor_mac() {
        Some(mac) if !mac.is_empty() => mac.to_string(),
        _ => return Err(DecodeError::MissingSensorId(kind)),
    };
    let time = record.time;
    let value = &record.value;

    let measurement = match kind {
        MeasurementKind::Temperature => Measurement::Temperature {
            sensor_id,
            temperature: real(kind, value)?,
            time,
        },
        MeasurementKind::Humidity => Measurement::Humidity {
            sensor_id,
            humidity: real(kind, value)?,
            time,
        },
        MeasurementKind::BatteryVoltage => Measurement::BatteryVoltage {
            sensor_id,
            voltage: real(kind, value)?,
            time,
        },
        MeasurementKind::Pm2p5 => Measurement::Pm2p5 {
            sensor_id,
            pm2p5: real(kind, value)?,
            time,
        },
        MeasurementKind::Pressure => Measurement::Pressure {
            sensor_id,
            pressure: integer(kind, value)?,
            time,
        },
        MeasurementKind::Co2 => Measurement::Co2 {
            sensor_id,
            co2: integer(kind, value)?,
            time,
        },
    };

    Ok(measurement)
}

fn real(kind: MeasurementKind, value: &FieldValue) -> Result<f64, DecodeError> {
    match value {
        FieldValue::Float64(v) => Ok(*v),
        other => Err(DecodeError::TypeMismatch {
            kind,
            found: other.type_name(),
        }),
    }
}

/// Widen any integer, truncate any real. Out-of-range values saturate.
fn integer(kind: MeasurementKind, value: &FieldValue) -> Result<i64, DecodeError> {
    match *value {
        FieldValue::Int8(v) => Ok(i64::from(v)),
        FieldValue::Int16(v) => Ok(i64::from(v)),
        FieldValue::Int32(v) => Ok(i64::from(v)),
        FieldValue::Int64(v) => Ok(v),
        FieldValue::UInt8(v) => Ok(i64::from(v)),
        FieldValue::UInt16(v) => Ok(i64::from(v)),
        FieldValue::UInt32(v) => Ok(i64::from(v)),
        FieldValue::UInt64(v) => Ok(i64::try_from(v).unwrap_or(i64::MAX)),
        FieldValue::Float32(v) => Ok(v as i64),
        FieldValue::Float64(v) => Ok(v as i64),
        ref other => Err(DecodeError::TypeMismatch {
            kind,
            found: other.type_name(),
        }),
    }
}
