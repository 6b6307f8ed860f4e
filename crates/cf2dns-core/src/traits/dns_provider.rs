// # DNS Provider Trait
//
// Defines the narrow capability the reconciler needs from a DNS provider.
//
// ## Implementations
//
// - Cloudflare: `cf2dns-provider-cloudflare` crate
// - Future: Route53, DNSPod, Alidns, etc.
//
// ## Usage
//
// ```rust,ignore
// use cf2dns_core::DnsProvider;
// use cf2dns_core::traits::RecordSpec;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.zone_id_by_name("example.com").await?;
//     let existing = provider.list_records(&zone_id, "cf1.example.com").await?;
//     let spec = RecordSpec::a("cf1.example.com", "1.1.1.1", 1);
//
//     match existing.first() {
//         Some(record) => provider.update_record(&zone_id, &record.id, &spec).await?,
//         None => provider.create_record(&zone_id, &spec).await?,
//     };
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Record type managed by this system
pub const RECORD_TYPE_A: &str = "A";

/// A DNS record as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// Record content (the IP for A records)
    pub content: String,
    /// Whether the provider proxies traffic for this record
    pub proxied: bool,
    /// Time-to-live (1 means "automatic" on Cloudflare)
    pub ttl: u32,
}

/// Desired state of an A record, used for both creation and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Fully-qualified record name
    pub name: String,
    /// The IP address to point at
    pub content: String,
    /// Time-to-live
    pub ttl: u32,
    /// Proxy flag
    pub proxied: bool,
}

impl RecordSpec {
    /// Describe an unproxied A record
    pub fn a(name: impl Into<String>, content: impl Into<String>, ttl: u32) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ttl,
            proxied: false,
        }
    }

    /// DNS record type written by this request
    pub fn record_type(&self) -> &'static str {
        RECORD_TYPE_A
    }
}

/// Trait for DNS provider implementations
///
/// Implementations translate each call into exactly one provider API
/// request. They never retry, never cache and never decide whether a
/// record should be created or updated; that belongs to
/// [`crate::reconciler`].
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve the zone identifier for a domain
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone ID
    /// - `Err(Error::NotFound)`: If the provider has no such zone
    async fn zone_id_by_name(&self, domain: &str) -> Result<String, crate::Error>;

    /// List records in a zone whose name equals `name`
    ///
    /// An empty list means the record does not exist yet.
    async fn list_records(&self, zone_id: &str, name: &str)
    -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a new record
    async fn create_record(
        &self,
        zone_id: &str,
        spec: &RecordSpec,
    ) -> Result<DnsRecord, crate::Error>;

    /// Overwrite an existing record, preserving its id
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        spec: &RecordSpec,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object
    fn create(
        &self,
        config: &crate::config::DnsProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
