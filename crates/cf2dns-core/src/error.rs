//! Error types for the cf2dns system
//!
//! This module defines all error types used throughout the crate.
//!
//! Skipping an incomplete target is not an error; it is reported as
//! [`TargetOutcome::Skipped`](crate::orchestrator::TargetOutcome::Skipped).

use thiserror::Error;

/// Result type alias for cf2dns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the cf2dns system
#[derive(Error, Debug)]
pub enum Error {
    /// Measurement transport failure (connect, timeout, non-2xx status)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Malformed measurement payload
    #[error("Decode error: {0}")]
    Decode(String),

    /// The measurement API reported an explicit failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The zone for a domain could not be resolved
    #[error("Zone lookup failed for {domain}: {message}")]
    ZoneLookup {
        /// Domain that was looked up
        domain: String,
        /// Underlying failure
        message: String,
    },

    /// A record could not be created
    #[error("Failed to create record {name}: {message}")]
    Create {
        /// Fully-qualified record name
        name: String,
        /// Underlying failure
        message: String,
    },

    /// Record updates failed and the caller asked for them to be fatal
    #[error("{} record update(s) failed: {}", .failed.len(), .failed.join(", "))]
    Update {
        /// Names whose update failed
        failed: Vec<String>,
    },

    /// The shared run deadline expired
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a zone lookup error
    pub fn zone_lookup(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ZoneLookup {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a record creation error
    pub fn create(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Create {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error ends the whole run regardless of failure policy
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_error_lists_names() {
        let err = Error::Update {
            failed: vec!["a.example.com".to_string(), "b.example.com".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "2 record update(s) failed: a.example.com, b.example.com"
        );
    }

    #[test]
    fn test_only_deadline_is_deadline() {
        assert!(Error::DeadlineExceeded.is_deadline());
        assert!(!Error::fetch("boom").is_deadline());
    }
}
