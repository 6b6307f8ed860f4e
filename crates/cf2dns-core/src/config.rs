//! Configuration types for the cf2dns system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Public measurement feed for Cloudflare endpoints
pub const DEFAULT_CLOUDFLARE_URL: &str = "https://www.wetest.vip/api/cf2dns/get_cloudflare_ip";

/// Public measurement feed for Gcore endpoints
pub const DEFAULT_GCORE_URL: &str = "https://www.wetest.vip/api/cf2dns/get_gcore_ip";

/// Main cf2dns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cf2DnsConfig {
    /// DNS provider configuration
    pub provider: DnsProviderConfig,

    /// CDN targets, processed in order
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,

    /// Optional run settings
    #[serde(default)]
    pub run: RunConfig,
}

impl Cf2DnsConfig {
    /// Load and validate a configuration file (JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without validating it
    ///
    /// Lets callers apply environment overrides before [`Self::validate`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            crate::Error::config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Incomplete targets are not rejected here; they are skipped at run time
    /// so that one half-configured CDN does not block the others.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.run.validate()?;
        Ok(())
    }
}

impl Default for Cf2DnsConfig {
    fn default() -> Self {
        Self {
            provider: DnsProviderConfig::default(),
            targets: default_targets(),
            run: RunConfig::default(),
        }
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DnsProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        #[serde(default)]
        api_token: String,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl DnsProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            DnsProviderConfig::Cloudflare { api_token } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            DnsProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            DnsProviderConfig::Cloudflare { .. } => "cloudflare",
            DnsProviderConfig::Custom { factory, .. } => factory,
        }
    }

    /// Replace the API token (used for environment overrides)
    pub fn set_api_token(&mut self, token: impl Into<String>) {
        if let DnsProviderConfig::Cloudflare { api_token } = self {
            *api_token = token.into();
        }
    }
}

impl Default for DnsProviderConfig {
    fn default() -> Self {
        DnsProviderConfig::Cloudflare {
            api_token: String::new(),
        }
    }
}

// The token must never reach the logs.
impl std::fmt::Debug for DnsProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnsProviderConfig::Cloudflare { .. } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .finish(),
            DnsProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// One CDN measurement feed and the records it drives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Label used in logs (e.g. "cloudflare", "gcore")
    #[serde(default)]
    pub name: String,

    /// Measurement API URL
    #[serde(default)]
    pub url: String,

    /// Zone apex the records live in (e.g. "example.com")
    #[serde(default)]
    pub domain: String,

    /// Subdomain labels to assign, in priority order (e.g. "cf1", "cf2")
    #[serde(default)]
    pub names: Vec<String>,

    /// Maximum accepted latency in milliseconds (inclusive)
    #[serde(default = "default_max_delay")]
    pub max_delay: u32,

    /// Minimum accepted bandwidth in Mbps (inclusive)
    #[serde(default)]
    pub min_bandwidth: u32,
}

impl TargetConfig {
    /// Create a target with default thresholds and no names
    pub fn new(name: impl Into<String>, url: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            domain: domain.into(),
            names: Vec::new(),
            max_delay: default_max_delay(),
            min_bandwidth: 0,
        }
    }

    /// Set the subdomain labels
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the admission thresholds
    pub fn with_thresholds(mut self, max_delay: u32, min_bandwidth: u32) -> Self {
        self.max_delay = max_delay;
        self.min_bandwidth = min_bandwidth;
        self
    }

    /// Why this target cannot be processed, if it cannot
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.url.trim().is_empty() {
            Some("measurement URL is empty")
        } else if self.domain.trim().is_empty() {
            Some("domain is empty")
        } else if self.names.is_empty() {
            Some("no subdomain names configured")
        } else {
            None
        }
    }
}

/// Behaviour when one target fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run on the first hard failure
    #[default]
    FailFast,
    /// Record the failure and move on to the next target
    Continue,
}

/// Run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Deadline shared by all targets (in seconds)
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Cross-target failure handling
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// TTL written to records (1 = automatic)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Treat record update failures as fatal once the batch is done
    #[serde(default)]
    pub fail_on_update_error: bool,
}

impl RunConfig {
    /// Validate the run settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.deadline_secs == 0 {
            return Err(crate::Error::config("Run deadline must be > 0"));
        }
        if self.ttl == 0 {
            return Err(crate::Error::config("Record TTL must be > 0"));
        }
        Ok(())
    }

    /// The run deadline as a duration
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
            failure_policy: FailurePolicy::default(),
            ttl: default_ttl(),
            fail_on_update_error: false,
        }
    }
}

fn default_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig::new("cloudflare", DEFAULT_CLOUDFLARE_URL, ""),
        TargetConfig::new("gcore", DEFAULT_GCORE_URL, ""),
    ]
}

fn default_max_delay() -> u32 {
    500
}

fn default_deadline_secs() -> u64 {
    300
}

fn default_ttl() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_target_defaults_from_json() {
        let target: TargetConfig = serde_json::from_str(
            r#"{"name": "cf", "url": "http://x", "domain": "example.com", "names": ["a"]}"#,
        )
        .unwrap();

        assert_eq!(target.max_delay, 500);
        assert_eq!(target.min_bandwidth, 0);
        assert_eq!(target.missing_field(), None);
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let target = TargetConfig::new("cf", "", "");
        assert_eq!(target.missing_field(), Some("measurement URL is empty"));

        let target = TargetConfig::new("cf", "http://x", " ");
        assert_eq!(target.missing_field(), Some("domain is empty"));

        let target = TargetConfig::new("cf", "http://x", "example.com");
        assert_eq!(target.missing_field(), Some("no subdomain names configured"));
    }

    #[test]
    fn test_default_config_targets_are_skippable() {
        let config = Cf2DnsConfig::default();
        assert_eq!(config.targets.len(), 2);
        assert!(config.targets.iter().all(|t| t.missing_field().is_some()));
        assert_eq!(config.run.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let config = Cf2DnsConfig::default();
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_deadline() {
        let mut config = Cf2DnsConfig::default();
        config.provider.set_api_token("token");
        config.run.deadline_secs = 0;
        assert!(config.validate().is_err());

        config.run.deadline_secs = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut provider = DnsProviderConfig::default();
        provider.set_api_token("secret_token_12345");
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token_12345"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "provider": {{"type": "cloudflare", "api_token": "token"}},
                "targets": [{{"name": "cf", "url": "http://x", "domain": "example.com",
                              "names": ["cf1", "cf2"], "max_delay": 150, "min_bandwidth": 10}}],
                "run": {{"failure_policy": "continue"}}
            }}"#
        )
        .unwrap();

        let config = Cf2DnsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.targets[0].names, vec!["cf1", "cf2"]);
        assert_eq!(config.targets[0].max_delay, 150);
        assert_eq!(config.run.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.run.deadline_secs, 300);
        assert_eq!(config.provider.type_name(), "cloudflare");
    }

    #[test]
    fn test_absent_targets_match_default() {
        let config: Cf2DnsConfig =
            serde_json::from_str(r#"{"provider": {"type": "cloudflare", "api_token": "token"}}"#)
                .unwrap();

        assert_eq!(config.targets, Cf2DnsConfig::default().targets);
        assert_eq!(config.targets[0].url, DEFAULT_CLOUDFLARE_URL);
        assert_eq!(config.targets[1].url, DEFAULT_GCORE_URL);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Cf2DnsConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
