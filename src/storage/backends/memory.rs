//! In-memory storage backend for testing

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::stats::{AggregateStats, AggregationKey, Opportunity, Proposal};
use crate::storage::{
    error::{StorageError, StorageResult},
    traits::*,
    types::TranslationContributionRecord,
};

/// In-memory source and sink.
///
/// Keeps every write attempt and reported summary so tests can assert on
/// what a run did, and can be told to fail reads or writes for given keys.
#[derive(Default)]
pub struct MemoryStore {
    proposals: Vec<Proposal>,
    opportunities: Vec<Opportunity>,
    records: Arc<RwLock<BTreeMap<String, TranslationContributionRecord>>>,
    write_attempts: Arc<RwLock<Vec<String>>>,
    summaries: Arc<RwLock<Vec<u64>>>,
    failing_keys: HashSet<String>,
    fail_reads: bool,
}

impl MemoryStore {
    pub fn new(proposals: Vec<Proposal>, opportunities: Vec<Opportunity>) -> Self {
        Self {
            proposals,
            opportunities,
            ..Self::default()
        }
    }

    /// Fail every write for the given canonical key
    pub fn with_write_failure(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Fail every read
    pub fn with_read_failure(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Seed a record as if an earlier run had written it
    pub async fn seed_record(&self, record: TranslationContributionRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    pub async fn records(&self) -> Vec<TranslationContributionRecord> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn record(&self, id: &str) -> Option<TranslationContributionRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn write_attempts(&self) -> Vec<String> {
        self.write_attempts.read().await.clone()
    }

    pub async fn summaries(&self) -> Vec<u64> {
        self.summaries.read().await.clone()
    }
}

#[async_trait]
impl RecordSource for MemoryStore {
    async fn read_proposals(&self, include_deleted: bool) -> StorageResult<Vec<Proposal>> {
        if self.fail_reads {
            return Err(StorageError::Injected("proposal read".to_string()));
        }
        Ok(self
            .proposals
            .iter()
            .filter(|p| include_deleted || !p.deleted)
            .cloned()
            .collect())
    }

    async fn read_opportunities(&self, include_deleted: bool) -> StorageResult<Vec<Opportunity>> {
        if self.fail_reads {
            return Err(StorageError::Injected("opportunity read".to_string()));
        }
        Ok(self
            .opportunities
            .iter()
            .filter(|o| include_deleted || !o.deleted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AggregateSink for MemoryStore {
    async fn write_aggregate(
        &self,
        key: &AggregationKey,
        stats: &AggregateStats,
    ) -> StorageResult<()> {
        let id = key.to_string();
        self.write_attempts.write().await.push(id.clone());

        if self.failing_keys.contains(&id) {
            return Err(StorageError::Injected(format!("write of {id}")));
        }

        let record = TranslationContributionRecord::from_stats(key, stats, Utc::now());
        self.records.write().await.insert(id, record);
        Ok(())
    }

    async fn report_run_summary(&self, records_produced: u64) -> StorageResult<()> {
        self.summaries.write().await.push(records_produced);
        Ok(())
    }
}
