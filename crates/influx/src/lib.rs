//! Time-series access for the gateway.
//!
//! A [`SeriesQuery`] describes what to fetch. A [`RecordSource`] executes it
//! and returns raw records: [`client::InfluxClient`] against an InfluxDB v2
//! server, [`memory::MemorySeries`] against samples held in memory. The
//! [`querier::Querier`] builds the queries and decodes the results.

use async_trait::async_trait;
use sensorgate_core::record::RawRecord;

pub mod client;
pub mod csv;
pub mod flux;
pub mod memory;
pub mod querier;
pub mod query;

pub use client::{InfluxClient, InfluxConfig};
pub use memory::MemorySeries;
pub use querier::{MeasurementProvider, Querier};
pub use query::{SeriesQuery, Shape, Span};

/// Errors from a time-series source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("InfluxDB API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body was not valid annotated CSV.
    #[error("Malformed CSV response: {0}")]
    Csv(String),
}

/// Something that can execute a [`SeriesQuery`].
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, query: &SeriesQuery) -> Result<Vec<RawRecord>, SourceError>;
}
