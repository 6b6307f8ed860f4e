//! Record reconciliation
//!
//! Maps `names[i] → ips[i]` under one domain and brings the provider in
//! line with list-then-create-or-update:
//!
//! | situation                 | action          | on failure                     |
//! |---------------------------|-----------------|--------------------------------|
//! | zone lookup               | -               | abort (`Error::ZoneLookup`)    |
//! | no record with that name  | create A record | abort (`Error::Create`)        |
//! | record(s) exist           | update first    | log, record, continue          |
//!
//! Names without a paired IP are left alone. Nothing is ever deleted.

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, Measurement, RecordSpec};
use tracing::{debug, info, warn};

/// Default TTL (1 = automatic on Cloudflare)
pub const DEFAULT_TTL: u32 = 1;

/// Positional assignment of candidate IPs to subdomain labels
///
/// Always holds `ips().len() <= names().len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    domain: String,
    names: Vec<String>,
    ips: Vec<String>,
}

impl UpdateRecord {
    /// Pair `names` with `ips`, dropping surplus IPs
    pub fn new<I>(domain: impl Into<String>, names: Vec<String>, ips: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let ips = ips.into_iter().take(names.len()).map(Into::into).collect();
        Self {
            domain: domain.into(),
            names,
            ips,
        }
    }

    /// Build from a ranked candidate list
    pub fn from_ranked(domain: impl Into<String>, names: Vec<String>, ranked: &[Measurement]) -> Self {
        Self::new(domain, names, ranked.iter().map(|m| m.ip.clone()))
    }

    /// Zone apex
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Subdomain labels, in priority order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Assigned IPs, never longer than `names()`
    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    /// `(label, ip)` pairs that will be reconciled
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(self.ips.iter())
            .map(|(n, ip)| (n.as_str(), ip.as_str()))
    }
}

/// Join a label with its domain
///
/// Both parts are trimmed. `"@"` or an empty label addresses the apex.
pub fn fqdn(label: &str, domain: &str) -> String {
    let label = label.trim();
    let domain = domain.trim().trim_end_matches('.');
    if label.is_empty() || label == "@" {
        domain.to_string()
    } else {
        format!("{}.{}", label, domain)
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// TTL written to created and updated records
    pub ttl: u32,
    /// Promote collected update failures to `Error::Update`
    pub fail_on_update_error: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            fail_on_update_error: false,
        }
    }
}

/// A change applied to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    /// Record didn't exist and was created
    Created {
        /// Fully-qualified name
        name: String,
        /// The new IP address
        ip: String,
    },
    /// Existing record was overwritten
    Updated {
        /// Fully-qualified name
        name: String,
        /// The new IP address
        ip: String,
        /// Content before the update
        previous: String,
    },
}

/// A tolerated update failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    /// Fully-qualified name
    pub name: String,
    /// The IP that could not be written
    pub ip: String,
    /// Provider error message
    pub message: String,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Zone the records live in
    pub zone_id: String,
    /// Applied changes, in name order
    pub changes: Vec<RecordChange>,
    /// Updates that failed but did not stop the pass
    pub update_failures: Vec<UpdateFailure>,
    /// Labels that had no candidate IP
    pub untouched: usize,
}

impl ReconcileReport {
    /// Number of created records
    pub fn created(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, RecordChange::Created { .. }))
            .count()
    }

    /// Number of updated records
    pub fn updated(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, RecordChange::Updated { .. }))
            .count()
    }
}

/// Bring the provider's records in line with `record`
///
/// # Errors
///
/// - `Error::ZoneLookup`: the domain's zone could not be resolved
/// - `Error::DnsProvider`: listing existing records failed
/// - `Error::Create`: a missing record could not be created; later names
///   are not attempted
/// - `Error::Update`: only with `fail_on_update_error`, after every name
///   was attempted
pub async fn reconcile(
    provider: &dyn DnsProvider,
    record: &UpdateRecord,
    options: &ReconcileOptions,
) -> Result<ReconcileReport> {
    info!(
        "Reconciling {} via {}: names=[{}] ips=[{}]",
        record.domain(),
        provider.provider_name(),
        record.names().join(","),
        record.ips().join(",")
    );

    let zone_id = provider
        .zone_id_by_name(record.domain())
        .await
        .map_err(|e| Error::zone_lookup(record.domain(), e.to_string()))?;
    debug!("Zone for {}: {}", record.domain(), zone_id);

    let mut report = ReconcileReport {
        zone_id: zone_id.clone(),
        untouched: record.names().len() - record.ips().len(),
        ..Default::default()
    };

    for (label, ip) in record.pairs() {
        let name = fqdn(label, record.domain());

        let existing = provider
            .list_records(&zone_id, &name)
            .await
            .map_err(|e| Error::dns_provider(format!("failed to list records for {}: {}", name, e)))?;

        let spec = RecordSpec::a(name.as_str(), ip, options.ttl);

        let Some(current) = existing.first() else {
            provider
                .create_record(&zone_id, &spec)
                .await
                .map_err(|e| Error::create(name.as_str(), e.to_string()))?;

            info!("Created {} -> {}", name, ip);
            report.changes.push(RecordChange::Created {
                name,
                ip: ip.to_string(),
            });
            continue;
        };

        if existing.len() > 1 {
            debug!("{} has {} records, updating the first ({})", name, existing.len(), current.id);
        }

        match provider.update_record(&zone_id, &current.id, &spec).await {
            Ok(_) => {
                info!("Updated {} -> {} (was: {})", name, ip, current.content);
                report.changes.push(RecordChange::Updated {
                    name,
                    ip: ip.to_string(),
                    previous: current.content.clone(),
                });
            }
            Err(e) => {
                warn!("Failed to update {} -> {}: {}", name, ip, e);
                report.update_failures.push(UpdateFailure {
                    name,
                    ip: ip.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    if report.untouched > 0 {
        debug!(
            "{} label(s) of {} had no candidate and were left untouched",
            report.untouched,
            record.domain()
        );
    }

    if options.fail_on_update_error && !report.update_failures.is_empty() {
        return Err(Error::Update {
            failed: report.update_failures.iter().map(|f| f.name.clone()).collect(),
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_update_record_truncates_ips() {
        let record = UpdateRecord::new("example.com", names(&["a", "b"]), ["1.1.1.1", "2.2.2.2", "3.3.3.3"]);
        assert_eq!(record.ips(), ["1.1.1.1", "2.2.2.2"]);
    }

    #[test]
    fn test_update_record_keeps_short_ip_list() {
        let record = UpdateRecord::new("example.com", names(&["a", "b"]), ["9.9.9.9"]);
        assert_eq!(record.names(), ["a", "b"]);
        assert_eq!(record.ips(), ["9.9.9.9"]);

        let pairs: Vec<_> = record.pairs().collect();
        assert_eq!(pairs, vec![("a", "9.9.9.9")]);
    }

    #[test]
    fn test_from_ranked_uses_ip_field() {
        let ranked = vec![
            Measurement::new("1.1.1.1", "A", 10, 10),
            Measurement::new("2.2.2.2", "B", 10, 10),
        ];
        let record = UpdateRecord::from_ranked("example.com", names(&["a"]), &ranked);
        assert_eq!(record.ips(), ["1.1.1.1"]);
    }

    #[test]
    fn test_fqdn() {
        assert_eq!(fqdn("cf1", "example.com"), "cf1.example.com");
        assert_eq!(fqdn(" cf1 ", " example.com "), "cf1.example.com");
        assert_eq!(fqdn("@", "example.com"), "example.com");
        assert_eq!(fqdn("", "example.com."), "example.com");
    }
}
