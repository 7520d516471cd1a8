//! HTTP client for the InfluxDB v2 query API.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use sensorgate_core::record::RawRecord;
use serde::Deserialize;

use crate::query::SeriesQuery;
use crate::{csv, flux, RecordSource, SourceError};

/// Connection parameters, loaded from a JSON file:
///
/// ```json
/// {
///   "address": "http://localhost:8086",
///   "org": "home",
///   "token": "...",
///   "bucket": "sensors",
///   "measurement": "ruuvi"
/// }
/// ```
#[derive(Clone, Deserialize)]
pub struct InfluxConfig {
    /// Base URL of the server.
    pub address: String,
    pub org: String,
    /// API token with read access to `bucket`.
    pub token: String,
    pub bucket: String,
    /// The `_measurement` every sensor sample is written under.
    pub measurement: String,
}

/// Errors loading an [`InfluxConfig`].
#[derive(Debug, thiserror::Error)]
pub enum InfluxConfigError {
    #[error("Cannot read InfluxDB config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid InfluxDB config: {0}")]
    Json(#[from] serde_json::Error),
}

impl InfluxConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InfluxConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl fmt::Debug for InfluxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxConfig")
            .field("address", &self.address)
            .field("org", &self.org)
            .field("token", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("measurement", &self.measurement)
            .finish()
    }
}

/// Query client for a single InfluxDB server.
pub struct InfluxClient {
    client: reqwest::Client,
    address: String,
    org: String,
    token: String,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &InfluxConfig) -> Self {
        Self {
            client,
            address: config.address.trim_end_matches('/').to_string(),
            org: config.org.clone(),
            token: config.token.clone(),
        }
    }

    /// Run a Flux script and return the raw annotated CSV body.
    ///
    /// Sends `POST /api/v2/query?org=<org>` asking for all three annotation
    /// rows so column types are known.
    pub async fn query_csv(&self, flux: &str) -> Result<String, SourceError> {
        let body = serde_json::json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "delimiter": ",",
                "annotations": ["datatype", "group", "default"],
            },
        });

        let response = self
            .client
            .post(format!("{}/api/v2/query", self.address))
            .query(&[("org", self.org.as_str())])
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    // ---- private helpers ----

    /// Returns the response unchanged on success, or
    /// [`SourceError::Api`] with the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RecordSource for InfluxClient {
    async fn fetch(&self, query: &SeriesQuery) -> Result<Vec<RawRecord>, SourceError> {
        let flux = flux::render(query);
        tracing::debug!(%flux, "Running Flux query");

        let body = self.query_csv(&flux).await?;
        csv::parse(&body)
    }
}
