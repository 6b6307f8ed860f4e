//! Core traits for the cf2dns system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`MeasurementSource`]: Retrieve raw endpoint measurements for a CDN
//! - [`DnsProvider`]: Look up, create and update DNS records via provider APIs

pub mod measurement_source;
pub mod dns_provider;

pub use measurement_source::{Measurement, MeasurementReport, MeasurementSource};
pub use dns_provider::{DnsProvider, DnsProviderFactory, DnsRecord, RecordSpec, RECORD_TYPE_A};
