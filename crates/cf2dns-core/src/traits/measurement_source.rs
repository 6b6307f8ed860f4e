// # Measurement Source Trait
//
// Defines the interface for retrieving raw IP measurements for a CDN.
//
// ## Implementations
//
// - HTTP-based: `cf2dns-source-http` crate
//
// ## Wire Format
//
// Measurement APIs answer with a JSON envelope keyed by carrier:
//
// ```json
// {
//   "status": true,
//   "code": 200,
//   "msg": "",
//   "info": {
//     "CM": [{ "ip": "1.1.1.1", "line_name": "CM", "bandwidth": 20, "delay": 50 }],
//     "CU": [{ "ip": "2.2.2.2", "line_name": "CU", "bandwidth": 30, "delay": 80 }]
//   }
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One measured endpoint as reported by the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// IPv4 or IPv6 literal
    pub ip: String,

    /// Network line (ISP / route) the measurement was taken on
    pub line_name: String,

    /// Measured bandwidth in Mbps
    #[serde(default, deserialize_with = "null_as_default")]
    pub bandwidth: u32,

    /// Measured latency in milliseconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub delay: u32,

    /// Geographic hint for the endpoint
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,

    /// Measured download speed
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed: u32,

    /// CDN data-centre code
    #[serde(default, deserialize_with = "null_as_default")]
    pub colo: String,
}

// Feeds send `null` for unmeasured fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Measurement {
    /// Create a measurement with empty metadata
    pub fn new(ip: impl Into<String>, line_name: impl Into<String>, delay: u32, bandwidth: u32) -> Self {
        Self {
            ip: ip.into(),
            line_name: line_name.into(),
            bandwidth,
            delay,
            address: String::new(),
            speed: 0,
            colo: String::new(),
        }
    }
}

/// Response envelope of a measurement API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementReport {
    /// `false` when the API reports a failure
    #[serde(default)]
    pub status: bool,

    /// API-level status code
    #[serde(default)]
    pub code: i64,

    /// API-level message, set on failure
    #[serde(default)]
    pub msg: String,

    /// Measurements keyed by carrier name
    #[serde(default)]
    pub info: Option<BTreeMap<String, Vec<Measurement>>>,
}

impl MeasurementReport {
    /// Decode a report from a raw response body
    pub fn from_slice(body: &[u8]) -> Result<Self, crate::Error> {
        serde_json::from_slice(body)
            .map_err(|e| crate::Error::decode(format!("invalid measurement payload: {}", e)))
    }

    /// Flatten the per-carrier arrays into one collection
    ///
    /// Carriers are visited in key order so the result is reproducible.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Measurement>)`: All measurements of all carriers
    /// - `Err(Error::Upstream)`: If the envelope carries `status: false`
    pub fn into_measurements(self) -> Result<Vec<Measurement>, crate::Error> {
        if !self.status {
            return Err(crate::Error::upstream(if self.msg.is_empty() {
                format!("API returned failure (code {})", self.code)
            } else {
                self.msg
            }));
        }

        Ok(self
            .info
            .unwrap_or_default()
            .into_values()
            .flatten()
            .collect())
    }
}

/// Trait for measurement source implementations
///
/// A source performs exactly one read per call and returns the flattened,
/// unfiltered measurement list. Filtering and ranking belong to
/// [`crate::ranking`].
///
/// # Errors
///
/// - `Error::Fetch`: transport failure or non-success HTTP status
/// - `Error::Decode`: malformed body
/// - `Error::Upstream`: the API answered with `status: false`
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Fetch all measurements published at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<Measurement>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
