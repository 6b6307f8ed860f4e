// # HTTP Measurement Source
//
// This crate provides an HTTP-based measurement source for the cf2dns system.
//
// ## Architecture
//
// Each call issues a single GET to the configured measurement API, decodes
// the `{status, code, msg, info}` envelope and returns the flattened
// measurement list. No retries, no caching, no background tasks.
//
// The `reqwest::Client` is owned by the source instance and can be supplied
// by the caller, so connection pools are scoped to one run rather than
// shared globally.

use async_trait::async_trait;
use cf2dns_core::traits::{Measurement, MeasurementReport, MeasurementSource};
use cf2dns_core::{Error, Result};

use std::time::Duration;

/// Default HTTP timeout for measurement requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-based measurement source
#[derive(Debug, Clone)]
pub struct HttpMeasurementSource {
    /// HTTP client
    client: reqwest::Client,
}

impl HttpMeasurementSource {
    /// Create a source with its own client and the default timeout
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Create a source around a caller-provided client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MeasurementSource for HttpMeasurementSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Measurement>> {
        tracing::debug!("Fetching measurements from {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(format!("HTTP error: {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read response: {}", e)))?;

        let measurements = MeasurementReport::from_slice(&body)?.into_measurements()?;
        tracing::debug!("Fetched {} measurement(s) from {}", measurements.len(), url);
        Ok(measurements)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
