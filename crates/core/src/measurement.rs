//! Typed sensor measurements.
//!
//! A [`Measurement`] is one sample of one channel from one sensor. The JSON
//! form is variant-specific: the payload key names the channel, so a
//! temperature serializes as `{"sensorID": .., "temperature": .., "time": ..}`
//! and a battery reading as `{"sensorID": .., "voltage": .., "time": ..}`.

use std::fmt;
use std::str::FromStr;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize, Serializer};

use crate::decode::DecodeError;
use crate::types::Timestamp;

/// The channels the gateway knows how to serve.
///
/// The string form is the `_field` name used in the time-series store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    Temperature,
    Humidity,
    Pressure,
    BatteryVoltage,
    Co2,
    Pm2p5,
}

impl MeasurementKind {
    pub const ALL: [MeasurementKind; 6] = [
        MeasurementKind::Temperature,
        MeasurementKind::Humidity,
        MeasurementKind::Pressure,
        MeasurementKind::BatteryVoltage,
        MeasurementKind::Co2,
        MeasurementKind::Pm2p5,
    ];

    /// Field name in the time-series store.
    pub fn field_name(self) -> &'static str {
        match self {
            MeasurementKind::Temperature => "temperature",
            MeasurementKind::Humidity => "humidity",
            MeasurementKind::Pressure => "pressure",
            MeasurementKind::BatteryVoltage => "batteryvoltage",
            MeasurementKind::Co2 => "co2",
            MeasurementKind::Pm2p5 => "pm2p5",
        }
    }

    /// Key carrying the numeric payload in the JSON representation.
    pub fn payload_key(self) -> &'static str {
        match self {
            MeasurementKind::BatteryVoltage => "voltage",
            other => other.field_name(),
        }
    }

    /// Whether the payload is an integer (pressure, CO2) rather than a real.
    pub fn is_integer(self) -> bool {
        matches!(self, MeasurementKind::Pressure | MeasurementKind::Co2)
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for MeasurementKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(DecodeError::EmptyField),
            "temperature" => Ok(MeasurementKind::Temperature),
            "humidity" => Ok(MeasurementKind::Humidity),
            "pressure" => Ok(MeasurementKind::Pressure),
            "batteryvoltage" => Ok(MeasurementKind::BatteryVoltage),
            "co2" => Ok(MeasurementKind::Co2),
            "pm2p5" => Ok(MeasurementKind::Pm2p5),
            other => Err(DecodeError::UnknownField(other.to_string())),
        }
    }
}

/// Numeric payload of a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementValue {
    Real(f64),
    Integer(i64),
}

impl MeasurementValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MeasurementValue::Real(v) => v,
            MeasurementValue::Integer(v) => v as f64,
        }
    }
}

impl fmt::Display for MeasurementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementValue::Real(v) => write!(f, "{v}"),
            MeasurementValue::Integer(v) => write!(f, "{v}"),
        }
    }
}

/// A single decoded sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    /// Degrees Celsius.
    Temperature {
        #[serde(rename = "sensorID")]
        sensor_id: String,
        temperature: f64,
        #[serde(serialize_with = "serialize_time")]
        time: Timestamp,
    },
    /// Relative humidity in percent. Not clamped to `[0, 100]`.
    Humidity {
        #[serde(rename = "sensorID")]
        sensor_id: String,
        humidity: f64,
        #[serde(serialize_with = "serialize_time")]
        time: Timestamp,
    },
    /// Pascal.
    Pressure {
        #[serde(rename = "sensorID")]
        sensor_id: String,
        pressure: i64,
        #[serde(serialize_with = "serialize_time")]
        time: Timestamp,
    },
    /// Volts.
    BatteryVoltage {
        #[serde(rename = "sensorID")]
        sensor_id: String,
        voltage: f64,
        #[serde(serialize_with = "serialize_time")]
        time: Timestamp,
    },
    /// Parts per million.
    Co2 {
        #[serde(rename = "sensorID")]
        sensor_id: String,
        co2: i64,
        #[serde(serialize_with = "serialize_time")]
        time: Timestamp,
    },
    /// Micrograms per cubic metre.
    Pm2p5 {
        #[serde(rename = "sensorID")]
        sensor_id: String,
        pm2p5: f64,
        #[serde(serialize_with = "serialize_time")]
        time: Timestamp,
    },
}

impl Measurement {
    pub fn kind(&self) -> MeasurementKind {
        match self {
            Measurement::Temperature { .. } => MeasurementKind::Temperature,
            Measurement::Humidity { .. } => MeasurementKind::Humidity,
            Measurement::Pressure { .. } => MeasurementKind::Pressure,
            Measurement::BatteryVoltage { .. } => MeasurementKind::BatteryVoltage,
            Measurement::Co2 { .. } => MeasurementKind::Co2,
            Measurement::Pm2p5 { .. } => MeasurementKind::Pm2p5,
        }
    }

    pub fn sensor_id(&self) -> &str {
        match self {
            Measurement::Temperature { sensor_id, .. }
            | Measurement::Humidity { sensor_id, .. }
            | Measurement::Pressure { sensor_id, .. }
            | Measurement::BatteryVoltage { sensor_id, .. }
            | Measurement::Co2 { sensor_id, .. }
            | Measurement::Pm2p5 { sensor_id, .. } => sensor_id,
        }
    }

    pub fn value(&self) -> MeasurementValue {
        match *self {
            Measurement::Temperature { temperature: v, .. }
            | Measurement::Humidity { humidity: v, .. }
            | Measurement::BatteryVoltage { voltage: v, .. }
            | Measurement::Pm2p5 { pm2p5: v, .. } => MeasurementValue::Real(v),
            Measurement::Pressure { pressure: v, .. } | Measurement::Co2 { co2: v, .. } => {
                MeasurementValue::Integer(v)
            }
        }
    }

    pub fn time(&self) -> Timestamp {
        match *self {
            Measurement::Temperature { time, .. }
            | Measurement::Humidity { time, .. }
            | Measurement::Pressure { time, .. }
            | Measurement::BatteryVoltage { time, .. }
            | Measurement::Co2 { time, .. }
            | Measurement::Pm2p5 { time, .. } => time,
        }
    }
}

/// RFC 3339 in UTC with a `Z` suffix; sub-second digits only when non-zero.
fn serialize_time<S: Serializer>(time: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
