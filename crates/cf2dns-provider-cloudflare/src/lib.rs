// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the
// cf2dns system.
//
// ## Behaviour
//
// - One HTTP request per trait call; the reconciler decides create vs update
// - Full error propagation (no retry, no backoff, no caching)
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - Dry-run mode: GET requests are performed, POST/PUT are only logged
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cf2dns_core::config::DnsProviderConfig;
use cf2dns_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, RecordSpec};
use cf2dns_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable selecting dry-run mode (`CF2DNS_MODE=dry-run`)
pub const MODE_ENV: &str = "CF2DNS_MODE";

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    proxied: bool,
    #[serde(default)]
    ttl: u32,
}

impl From<Record> for DnsRecord {
    fn from(r: Record) -> Self {
        DnsRecord {
            id: r.id,
            name: r.name,
            record_type: r.record_type,
            content: r.content,
            proxied: r.proxied,
            ttl: r.ttl,
        }
    }
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended POST/PUT payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform GET requests but skip POST/PUT
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty, `Error::Http` if the HTTP
    /// client cannot be built.
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a new Cloudflare provider (production/live mode)
    pub fn new_live(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, false)
    }

    /// Create a new Cloudflare provider (dry-run mode)
    pub fn new_dry_run(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, true)
    }

    /// Point the provider at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and unwrap the v4 envelope
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, what, &error_text));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            return Err(Error::provider(
                "cloudflare",
                format!("{} failed: {}", what, join_messages(&envelope.errors)),
            ));
        }

        envelope
            .result
            .ok_or_else(|| Error::provider("cloudflare", format!("{}: response has no result", what)))
    }

    fn write_payload(spec: &RecordSpec) -> serde_json::Value {
        serde_json::json!({
            "type": spec.record_type(),
            "name": spec.name,
            "content": spec.content,
            "ttl": spec.ttl,
            "proxied": spec.proxied,
        })
    }

    fn dry_run_record(id: &str, spec: &RecordSpec) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            name: spec.name.clone(),
            record_type: spec.record_type().to_string(),
            content: spec.content.clone(),
            proxied: spec.proxied,
            ttl: spec.ttl,
        }
    }
}

/// Map a non-2xx status to an error
fn status_error(status: reqwest::StatusCode, what: &str, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions ({}). Status: {}",
            what, status
        )),
        404 => Error::not_found(format!("{}: {}", what, body)),
        409 => Error::provider(
            "cloudflare",
            format!("Conflict during {}: {}", what, body),
        ),
        429 => Error::rate_limited(format!("{}. Status: {}", what, status)),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient) during {}: {} - {}", what, status, body),
        ),
        _ => Error::provider("cloudflare", format!("{} failed: {} - {}", what, status, body)),
    }
}

fn join_messages(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "unknown error".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn zone_id_by_name(&self, domain: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for domain: {}", domain);

        let request = self.client.get(self.url("/zones")).query(&[("name", domain)]);
        let zones: Vec<Zone> = self.send(request, "zone lookup").await?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?name=cf1.example.com
    /// ```
    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing records named {}", name);

        let request = self
            .client
            .get(self.url(&format!("/zones/{}/dns_records", zone_id)))
            .query(&[("name", name)]);
        let records: Vec<Record> = self.send(request, "record lookup").await?;

        Ok(records.into_iter().map(DnsRecord::from).collect())
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "A", "name": "...", "content": "1.2.3.4", "ttl": 1, "proxied": false }
    /// ```
    async fn create_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<DnsRecord> {
        let url = self.url(&format!("/zones/{}/dns_records", zone_id));
        let payload = Self::write_payload(spec);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send POST request to {} with payload: {}", url, payload);
            return Ok(Self::dry_run_record("dry-run", spec));
        }

        let request = self.client.post(url).json(&payload);
        let record: Record = self.send(request, "record creation").await?;
        Ok(record.into())
    }

    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "...", "content": "1.2.3.4", "ttl": 1, "proxied": false }
    /// ```
    async fn update_record(&self, zone_id: &str, record_id: &str, spec: &RecordSpec) -> Result<DnsRecord> {
        let url = self.url(&format!("/zones/{}/dns_records/{}", zone_id, record_id));
        let payload = Self::write_payload(spec);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send PUT request to {} with payload: {}", url, payload);
            return Ok(Self::dry_run_record(record_id, spec));
        }

        let request = self.client.put(url).json(&payload);
        let record: Record = self.send(request, "record update").await?;
        Ok(record.into())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &DnsProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            DnsProviderConfig::Cloudflare { api_token } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }

                let dry_run = std::env::var(MODE_ENV)
                    .unwrap_or_default()
                    .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(CloudflareProvider::new(api_token.clone(), dry_run)?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use cf2dns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// cf2dns_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &cf2dns_core::ProviderRegistry) {
    registry.register_provider("cloudflare", Box::new(CloudflareFactory));
}
