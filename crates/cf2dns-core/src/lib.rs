// # cf2dns-core
//
// Core library for CDN endpoint selection and DNS record reconciliation.
//
// ## Architecture Overview
//
// This library provides the core functionality for pointing a fixed set of
// subdomains at the best-measured CDN endpoints:
// - **MeasurementSource**: Trait for retrieving raw endpoint measurements
// - **DnsProvider**: Trait for zone lookup and A-record create/update
// - **ranking**: Admission filter, per-line grouping, round-robin interleave
// - **reconciler**: Positional name → IP list-then-create-or-update
// - **Orchestrator**: Sequential pass over all targets under one deadline
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Stateless**: The DNS records themselves are the only durable state
// 5. **No Retries**: Failures surface immediately; only record updates are tolerated

pub mod traits;
pub mod ranking;
pub mod reconciler;
pub mod orchestrator;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, MeasurementSource, Measurement};
pub use orchestrator::{Orchestrator, RunReport, TargetOutcome};
pub use reconciler::{UpdateRecord, ReconcileOptions, ReconcileReport};
pub use registry::ProviderRegistry;
pub use config::{Cf2DnsConfig, DnsProviderConfig, TargetConfig, RunConfig, FailurePolicy};
pub use error::{Error, Result};
