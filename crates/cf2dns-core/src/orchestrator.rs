//! Run orchestration
//!
//! The Orchestrator drives one pass over all configured targets:
//!
//! ```text
//! ┌──────────────┐   rank()   ┌──────────────────┐
//! │ TargetConfig │──────────▶ │ MeasurementSource│
//! └──────────────┘            └──────────────────┘
//!        │                             │ ranked candidates
//!        │                             ▼
//!        │                    ┌──────────────────┐ reconcile() ┌─────────────┐
//!        └──────────────────▶ │   UpdateRecord   │───────────▶ │ DnsProvider │
//!                             └──────────────────┘             └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Skip targets missing a URL, domain or names (logged, not an error)
//! 2. Fetch and rank candidates
//! 3. Truncate to the number of names and reconcile
//! 4. Repeat for the next target
//!
//! Targets run sequentially under one shared deadline. When it expires the
//! in-flight request is dropped and the run ends with
//! `Error::DeadlineExceeded`. Completed targets are never rolled back.

use crate::config::{FailurePolicy, RunConfig, TargetConfig};
use crate::error::{Error, Result};
use crate::ranking;
use crate::reconciler::{self, ReconcileOptions, ReconcileReport, UpdateRecord};
use crate::traits::{DnsProvider, MeasurementSource};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What happened to one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Records were reconciled
    Applied {
        /// Target label
        target: String,
        /// Reconciliation details
        report: ReconcileReport,
    },
    /// Target configuration was incomplete
    Skipped {
        /// Target label
        target: String,
        /// Missing piece
        reason: String,
    },
    /// Target failed under `FailurePolicy::Continue`
    Failed {
        /// Target label
        target: String,
        /// Error message
        message: String,
    },
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// One entry per processed target, in order
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    /// Targets that failed under `FailurePolicy::Continue`
    pub fn failures(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TargetOutcome::Failed { .. }))
    }

    /// Whether any target failed
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Sequential driver for fetch → rank → reconcile
pub struct Orchestrator {
    /// Measurement feed reader
    source: Box<dyn MeasurementSource>,

    /// DNS provider the records are written to
    provider: Box<dyn DnsProvider>,

    /// Cross-target failure handling
    failure_policy: FailurePolicy,

    /// Per-record settings
    options: ReconcileOptions,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// # Parameters
    ///
    /// - `source`: measurement source implementation
    /// - `provider`: DNS provider implementation
    /// - `run`: run settings (failure policy, TTL, update strictness)
    pub fn new(
        source: Box<dyn MeasurementSource>,
        provider: Box<dyn DnsProvider>,
        run: &RunConfig,
    ) -> Self {
        Self {
            source,
            provider,
            failure_policy: run.failure_policy,
            options: ReconcileOptions {
                ttl: run.ttl,
                fail_on_update_error: run.fail_on_update_error,
            },
        }
    }

    /// Process every target before `deadline`
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: every target was applied, skipped, or (under
    ///   `FailurePolicy::Continue`) recorded as failed
    /// - `Err(Error::DeadlineExceeded)`: the deadline expired
    /// - `Err(Error)`: first hard failure under `FailurePolicy::FailFast`
    pub async fn run(&self, deadline: Instant, targets: &[TargetConfig]) -> Result<RunReport> {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(targets.len());

        info!(
            "Starting run: {} target(s), source={}, provider={}",
            targets.len(),
            self.source.source_name(),
            self.provider.provider_name()
        );

        for target in targets {
            if Instant::now() >= deadline {
                error!("Deadline reached before target {}", target.name);
                return Err(Error::DeadlineExceeded);
            }

            if let Some(reason) = target.missing_field() {
                warn!("Skipping target {}: {}", target.name, reason);
                outcomes.push(TargetOutcome::Skipped {
                    target: target.name.clone(),
                    reason: reason.to_string(),
                });
                continue;
            }

            let result = tokio::time::timeout_at(deadline, self.process(target))
                .await
                .unwrap_or(Err(Error::DeadlineExceeded));

            match result {
                Ok(report) => {
                    info!(
                        "Target {} done: {} created, {} updated, {} update failure(s)",
                        target.name,
                        report.created(),
                        report.updated(),
                        report.update_failures.len()
                    );
                    outcomes.push(TargetOutcome::Applied {
                        target: target.name.clone(),
                        report,
                    });
                }
                Err(e) if e.is_deadline() || self.failure_policy == FailurePolicy::FailFast => {
                    error!("Target {} failed: {}", target.name, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Target {} failed, continuing: {}", target.name, e);
                    outcomes.push(TargetOutcome::Failed {
                        target: target.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        })
    }

    /// Rank and reconcile a single, complete target
    async fn process(&self, target: &TargetConfig) -> Result<ReconcileReport> {
        let ranked = ranking::rank(self.source.as_ref(), target).await?;
        if ranked.is_empty() {
            warn!("Target {}: no endpoint passed the admission filter", target.name);
        }

        let record = UpdateRecord::from_ranked(target.domain.as_str(), target.names.clone(), &ranked);
        debug!(
            "Target {}: assigning {} of {} candidate(s) to {} name(s)",
            target.name,
            record.ips().len(),
            ranked.len(),
            record.names().len()
        );

        reconciler::reconcile(self.provider.as_ref(), &record, &self.options).await
    }
}
