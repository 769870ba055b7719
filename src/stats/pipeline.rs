//! Join and group-by orchestration
//!
//! Runs the whole computation over an in-memory snapshot of both record sets:
//!
//! 1. keep only proposals of the configured suggestion type
//! 2. group proposals by `target_id`
//! 3. index opportunities by `id`, rejecting duplicate ids
//! 4. left-outer co-group: every proposal group gets its opportunity or none
//! 5. derive keyed events and reduce them per key on the rayon pool
//!
//! Each rayon worker folds the groups it is handed into its own map of
//! per-key accumulators; the maps are then merged pairwise. Because the
//! accumulator merge is associative and commutative, the result does not
//! depend on how rayon splits the work.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::aggregator::StatsAccumulator;
use super::deriver::derive_events;
use super::key::AggregationKey;
use super::types::{AggregateStats, Opportunity, Proposal, SUGGESTION_TYPE_TRANSLATE_CONTENT};
use crate::error::{Result, StatsError};

pub type KeyedAccumulators = HashMap<AggregationKey, StatsAccumulator>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Only proposals of this type are aggregated
    pub suggestion_type: String,
    /// Size of a dedicated worker pool; `None` uses rayon's global pool
    pub threads: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            suggestion_type: SUGGESTION_TYPE_TRANSLATE_CONTENT.to_string(),
            threads: None,
        }
    }
}

/// Counts describing what the pipeline saw and did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationReport {
    pub proposals_read: usize,
    /// Proposals of the configured suggestion type
    pub proposals_considered: usize,
    pub target_groups: usize,
    /// Target groups that found an opportunity
    pub matched_targets: usize,
    pub events_derived: u64,
    /// Proposals dropped as malformed
    pub records_skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationOutput {
    /// Finished statistics, one per key, sorted by key
    pub aggregates: Vec<AggregateStats>,
    pub report: DerivationReport,
}

/// Proposals of one target joined with the opportunity they target
#[derive(Debug)]
pub struct TargetGroup<'a> {
    pub target_id: String,
    pub proposals: Vec<Proposal>,
    pub opportunity: Option<&'a Opportunity>,
}

/// Compute statistics for every aggregation key found in the inputs.
///
/// Fails only on data-integrity problems (duplicate opportunity ids) or when
/// the worker pool cannot be built. No partial output is returned on failure.
pub fn compute_stats(
    proposals: Vec<Proposal>,
    opportunities: Vec<Opportunity>,
    options: &PipelineOptions,
) -> Result<AggregationOutput> {
    match options.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("contrib-stats-{i}"))
                .build()
                .map_err(|e| StatsError::Config(format!("Cannot build worker pool: {e}")))?;
            pool.install(|| run(proposals, opportunities, options))
        }
        None => run(proposals, opportunities, options),
    }
}

fn run(
    proposals: Vec<Proposal>,
    opportunities: Vec<Opportunity>,
    options: &PipelineOptions,
) -> Result<AggregationOutput> {
    let proposals_read = proposals.len();
    let relevant = filter_by_type(proposals, &options.suggestion_type);
    let proposals_considered = relevant.len();
    debug!(
        "Considering {} of {} proposals of type '{}'",
        proposals_considered, proposals_read, options.suggestion_type
    );

    let by_target = group_by_target(relevant);
    let index = index_opportunities(opportunities)?;
    let groups = co_group(by_target, &index);
    let matched_targets = groups.iter().filter(|g| g.opportunity.is_some()).count();
    debug!(
        "Joined {} target groups, {} with an opportunity",
        groups.len(),
        matched_targets
    );

    let mut aggregates: Vec<AggregateStats> = reduce_by_key(&groups)
        .into_values()
        .map(StatsAccumulator::extract)
        .collect();
    aggregates.sort_by_key(AggregateStats::key);
    check_storable_keys(&aggregates)?;

    let events_derived: u64 = aggregates.iter().map(|s| s.submitted_count).sum();
    let report = DerivationReport {
        proposals_read,
        proposals_considered,
        target_groups: groups.len(),
        matched_targets,
        events_derived,
        records_skipped: proposals_considered as u64 - events_derived,
    };

    info!(
        "Aggregated {} events into {} keys ({} skipped)",
        report.events_derived,
        aggregates.len(),
        report.records_skipped
    );

    Ok(AggregationOutput { aggregates, report })
}

/// Fail if any key's canonical id would not parse back into that key.
///
/// Such ids either collide with another key's id or cannot be read back,
/// so writing them would overwrite or orphan an aggregate.
pub fn check_storable_keys(aggregates: &[AggregateStats]) -> Result<()> {
    let mut first_bad = None;
    for key in aggregates.iter().map(AggregateStats::key) {
        if !key.round_trips() {
            error!("Aggregation key '{}' has no unique canonical id", key);
            first_bad.get_or_insert(key);
        }
    }

    match first_bad {
        Some(key) => Err(StatsError::UnrepresentableKey {
            id: key.to_string(),
        }),
        None => Ok(()),
    }
}

/// Keep proposals of the given suggestion type.
pub fn filter_by_type(proposals: Vec<Proposal>, suggestion_type: &str) -> Vec<Proposal> {
    proposals
        .into_iter()
        .filter(|p| p.suggestion_type == suggestion_type)
        .collect()
}

/// Group proposals by the opportunity id they target.
pub fn group_by_target(proposals: Vec<Proposal>) -> HashMap<String, Vec<Proposal>> {
    let mut groups: HashMap<String, Vec<Proposal>> = HashMap::new();
    for proposal in proposals {
        groups
            .entry(proposal.target_id.clone())
            .or_default()
            .push(proposal);
    }
    groups
}

/// Index opportunities by id.
///
/// Every duplicated id is logged; the error names the smallest one so
/// repeated runs over the same data report the same id.
pub fn index_opportunities(opportunities: Vec<Opportunity>) -> Result<HashMap<String, Opportunity>> {
    let mut index: HashMap<String, Opportunity> = HashMap::with_capacity(opportunities.len());
    let mut duplicates: HashMap<String, usize> = HashMap::new();

    for opportunity in opportunities {
        if index.contains_key(&opportunity.id) {
            *duplicates.entry(opportunity.id.clone()).or_insert(1) += 1;
        } else {
            index.insert(opportunity.id.clone(), opportunity);
        }
    }

    let mut duplicates: Vec<(String, usize)> = duplicates.into_iter().collect();
    duplicates.sort();
    for (id, occurrences) in &duplicates {
        error!("Opportunity id '{}' appears {} times", id, occurrences);
    }

    match duplicates.into_iter().next() {
        Some((id, occurrences)) => Err(StatsError::DuplicateOpportunity { id, occurrences }),
        None => Ok(index),
    }
}

/// Left-outer co-group of proposal groups with the opportunity index.
pub fn co_group(
    by_target: HashMap<String, Vec<Proposal>>,
    index: &HashMap<String, Opportunity>,
) -> Vec<TargetGroup<'_>> {
    by_target
        .into_iter()
        .map(|(target_id, proposals)| {
            let opportunity = index.get(&target_id);
            TargetGroup {
                target_id,
                proposals,
                opportunity,
            }
        })
        .collect()
}

/// Derive events for every group and reduce them per aggregation key.
pub fn reduce_by_key(groups: &[TargetGroup<'_>]) -> KeyedAccumulators {
    groups
        .par_iter()
        .fold(KeyedAccumulators::new, |mut acc, group| {
            for (key, event) in derive_events(&group.proposals, group.opportunity) {
                let partial = acc
                    .remove(&key)
                    .unwrap_or_else(|| StatsAccumulator::identity(&key));
                acc.insert(key, partial.fold(&event));
            }
            acc
        })
        .reduce(KeyedAccumulators::new, merge_keyed)
}

/// Merge two per-key accumulator maps.
pub fn merge_keyed(a: KeyedAccumulators, b: KeyedAccumulators) -> KeyedAccumulators {
    let (mut into, from) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    for (key, partial) in from {
        let merged = match into.remove(&key) {
            Some(existing) => existing.merge(partial),
            None => partial,
        };
        into.insert(key, merged);
    }
    into
}
