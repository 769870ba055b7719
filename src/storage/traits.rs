//! Collaborator interfaces around the aggregation core

use async_trait::async_trait;

use super::error::StorageResult;
use crate::stats::{AggregateStats, AggregationKey, Opportunity, Proposal};

/// Source of the raw record sets a run aggregates
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All proposals regardless of suggestion type; deleted ones only on request
    async fn read_proposals(&self, include_deleted: bool) -> StorageResult<Vec<Proposal>>;

    /// All opportunities; deleted ones only on request
    async fn read_opportunities(&self, include_deleted: bool) -> StorageResult<Vec<Opportunity>>;
}

/// Destination for finished aggregates
#[async_trait]
pub trait AggregateSink: Send + Sync {
    /// Persist one finished aggregate, replacing any stored record for `key`
    async fn write_aggregate(&self, key: &AggregationKey, stats: &AggregateStats)
        -> StorageResult<()>;

    /// Called once per run after every aggregate was written
    async fn report_run_summary(&self, records_produced: u64) -> StorageResult<()>;
}
