//! Annotated CSV, as returned by the InfluxDB v2 query API.
//!
//! A response is a sequence of tables separated by blank lines. Each table
//! may open with annotation rows (`#datatype`, `#group`, `#default`)
//! followed by a header row; the first column of every row is reserved for
//! annotations and is empty in header and data rows.
//!
//! ```text
//! #datatype,string,long,dateTime:RFC3339,double,string,string,string
//! #group,false,false,false,false,true,true,true
//! #default,_result,,,,,,
//! ,result,table,_time,_value,_field,_measurement,sensormac
//! ,,0,2024-01-01T00:30:00Z,20,temperature,ruuvi,AA:BB
//! ```

use chrono::{DateTime, Utc};
use sensorgate_core::record::{FieldValue, RawRecord};
use sensorgate_core::types::Timestamp;

use crate::SourceError;

/// Parse a full response body into records.
///
/// A query error reported inside the body (an `error` column) is returned
/// as [`SourceError::Csv`].
pub fn parse(body: &str) -> Result<Vec<RawRecord>, SourceError> {
    let mut records = Vec::new();
    let mut table = Table::default();

    for row in split_rows(body)? {
        if row.is_empty() {
            table = Table::default();
            continue;
        }

        match row[0].as_str() {
            "#datatype" => {
                table.datatypes = row;
                table.header = None;
                continue;
            }
            "#default" => {
                table.defaults = row;
                table.header = None;
                continue;
            }
            annotation if annotation.starts_with('#') => {
                table.header = None;
                continue;
            }
            _ => {}
        }

        if let Some(header) = &table.header {
            records.push(table.record(header, &row)?);
        } else {
            table.header = Some(row);
        }
    }

    Ok(records)
}

#[derive(Debug, Default)]
struct Table {
    datatypes: Vec<String>,
    defaults: Vec<String>,
    header: Option<Vec<String>>,
}

impl Table {
    fn record(&self, header: &[String], row: &[String]) -> Result<RawRecord, SourceError> {
        let mut field = None;
        let mut value = FieldValue::Null;
        let mut time: Option<Timestamp> = None;
        let mut record_tags = Vec::new();

        for (i, name) in header.iter().enumerate() {
            let cell = match row.get(i).map(String::as_str) {
                Some(cell) if !cell.is_empty() => cell,
                _ => self.defaults.get(i).map(String::as_str).unwrap_or(""),
            };
            let datatype = self.datatypes.get(i).map(String::as_str).unwrap_or("string");

            match name.as_str() {
                "error" if !cell.is_empty() => {
                    return Err(SourceError::Csv(format!("query failed: {cell}")));
                }
                "" | "result" | "table" | "error" | "reference" => {}
                "_field" => field = Some(cell.to_string()),
                "_value" => value = typed(name, datatype, cell)?,
                "_time" => time = Some(parse_time(cell)?),
                "_measurement" => record_tags.push((name.clone(), typed(name, datatype, cell)?)),
                other if other.starts_with('_') => {}
                _ => record_tags.push((name.clone(), typed(name, datatype, cell)?)),
            }
        }

        let field = field.ok_or_else(|| SourceError::Csv("missing _field column".into()))?;
        let time = time.ok_or_else(|| SourceError::Csv("missing _time column".into()))?;

        let mut record = RawRecord::new(field, value, time);
        record.tags.extend(record_tags);
        Ok(record)
    }
}

/// Convert a cell according to its `#datatype` annotation.
fn typed(column: &str, datatype: &str, cell: &str) -> Result<FieldValue, SourceError> {
    if cell.is_empty() {
        return Ok(FieldValue::Null);
    }

    let bad = || SourceError::Csv(format!("column {column}: cannot parse {cell:?} as {datatype}"));

    let value = match datatype {
        "long" => FieldValue::Int64(cell.parse().map_err(|_| bad())?),
        "unsignedLong" => FieldValue::UInt64(cell.parse().map_err(|_| bad())?),
        "double" => FieldValue::Float64(cell.parse().map_err(|_| bad())?),
        "boolean" => match cell {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => return Err(bad()),
        },
        _ => FieldValue::String(cell.to_string()),
    };
    Ok(value)
}

fn parse_time(cell: &str) -> Result<Timestamp, SourceError> {
    DateTime::parse_from_rfc3339(cell)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| SourceError::Csv(format!("column _time: {cell:?}: {e}")))
}

/// Split a body into rows of cells, honouring quoted cells.
///
/// A blank line yields an empty row.
fn split_rows(body: &str) -> Result<Vec<Vec<String>>, SourceError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut line_has_content = false;

    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                line_has_content = true;
            }
            ',' => {
                row.push(std::mem::take(&mut cell));
                line_has_content = true;
            }
            '\r' => {}
            '\n' => {
                if line_has_content {
                    row.push(std::mem::take(&mut cell));
                }
                rows.push(std::mem::take(&mut row));
                line_has_content = false;
            }
            _ => {
                cell.push(c);
                line_has_content = true;
            }
        }
    }

    if in_quotes {
        return Err(SourceError::Csv("unterminated quoted cell".into()));
    }
    if line_has_content {
        row.push(cell);
        rows.push(row);
    }

    Ok(rows)
}
