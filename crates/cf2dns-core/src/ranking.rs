//! Ranked candidate selection
//!
//! Turns a raw measurement feed into an ordered candidate list:
//!
//! ```text
//! fetch ──▶ admit ──▶ group_by_line ──▶ interleave ──▶ ranked list
//! ```
//!
//! Interleaving takes one endpoint per line per round, so the first K
//! candidates cover as many distinct lines as exist before any line
//! contributes a second one. Lines are visited in ascending name order,
//! which keeps the output reproducible.
//!
//! The ranked list is not truncated here; see
//! [`UpdateRecord::new`](crate::reconciler::UpdateRecord::new).

use crate::config::TargetConfig;
use crate::error::Result;
use crate::traits::{Measurement, MeasurementSource};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Fetch, filter and rank the endpoints of one target
///
/// # Errors
///
/// Any error of the source (`Fetch`, `Decode`, `Upstream`) is returned as
/// is; no partial list is produced.
pub async fn rank(source: &dyn MeasurementSource, target: &TargetConfig) -> Result<Vec<Measurement>> {
    let measurements = source.fetch(&target.url).await?;
    let fetched = measurements.len();

    let admitted = admit(measurements, target.max_delay, target.min_bandwidth);
    debug!(
        "{}: {} of {} measurement(s) admitted (max_delay={}ms, min_bandwidth={}Mbps)",
        target.name,
        admitted.len(),
        fetched,
        target.max_delay,
        target.min_bandwidth
    );

    let ranked = interleave(group_by_line(admitted));
    debug!("{}: ranked {} candidate(s)", target.name, ranked.len());
    Ok(ranked)
}

/// Keep measurements with `delay <= max_delay` and `bandwidth >= min_bandwidth`
pub fn admit(measurements: Vec<Measurement>, max_delay: u32, min_bandwidth: u32) -> Vec<Measurement> {
    measurements
        .into_iter()
        .filter(|m| m.delay <= max_delay && m.bandwidth >= min_bandwidth)
        .collect()
}

/// Partition by line name, each group sorted by ascending delay
///
/// The sort is stable: equal delays keep their input order.
pub fn group_by_line(measurements: Vec<Measurement>) -> BTreeMap<String, Vec<Measurement>> {
    let mut groups: BTreeMap<String, Vec<Measurement>> = BTreeMap::new();
    for m in measurements {
        groups.entry(m.line_name.clone()).or_default().push(m);
    }

    for group in groups.values_mut() {
        group.sort_by_key(|m| m.delay);
    }

    groups
}

/// Round-robin over the groups until every group is drained
pub fn interleave(groups: BTreeMap<String, Vec<Measurement>>) -> Vec<Measurement> {
    let total = groups.values().map(Vec::len).sum();
    let mut queues: Vec<VecDeque<Measurement>> = groups
        .into_values()
        .map(VecDeque::from)
        .filter(|q| !q.is_empty())
        .collect();

    let mut ranked = Vec::with_capacity(total);
    while !queues.is_empty() {
        for queue in &mut queues {
            if let Some(head) = queue.pop_front() {
                ranked.push(head);
            }
        }
        queues.retain(|q| !q.is_empty());
    }

    ranked
}
