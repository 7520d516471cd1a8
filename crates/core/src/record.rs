//! Raw records as returned by the time-series store.
//!
//! The store hands back values whose runtime type depends on how the sample
//! was written (and on any aggregation applied by the query), so a record
//! keeps the value as a [`FieldValue`] and leaves interpretation to
//! [`crate::decode`].

use std::collections::BTreeMap;

use crate::types::Timestamp;

/// Tag holding the sensor hardware address.
pub const SENSOR_MAC_TAG: &str = "sensormac";

/// A dynamically-typed scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl FieldValue {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int8(_) => "i8",
            FieldValue::Int16(_) => "i16",
            FieldValue::Int32(_) => "i32",
            FieldValue::Int64(_) => "i64",
            FieldValue::UInt8(_) => "u8",
            FieldValue::UInt16(_) => "u16",
            FieldValue::UInt32(_) => "u32",
            FieldValue::UInt64(_) => "u64",
            FieldValue::Float32(_) => "f32",
            FieldValue::Float64(_) => "f64",
            FieldValue::String(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float64(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int64(value)
    }
}

/// One row of a time-series query result.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// The `_field` column.
    pub field: String,
    /// The `_value` column.
    pub value: FieldValue,
    /// Every other named column (`sensormac`, `_measurement`, ...).
    pub tags: BTreeMap<String, FieldValue>,
    /// The `_time` column.
    pub time: Timestamp,
}

impl RawRecord {
    pub fn new(field: impl Into<String>, value: FieldValue, time: Timestamp) -> Self {
        Self {
            field: field.into(),
            value,
            tags: BTreeMap::new(),
            time,
        }
    }

    /// Builder-style tag insertion.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&FieldValue> {
        self.tags.get(key)
    }

    /// The `sensormac` tag, if present and a string.
    pub fn sensor_mac(&self) -> Option<&str> {
        self.tag(SENSOR_MAC_TAG).and_then(FieldValue::as_str)
    }
}
