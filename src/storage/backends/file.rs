//! JSON-lines file backend
//!
//! Inputs are read from one JSON object per line. Output records are kept in
//! memory as the run writes them and flushed as a whole when the run summary
//! is reported, so an aborted run never leaves a partially written file.
//! Records from earlier runs whose keys were not produced again are kept.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::stats::{AggregateStats, AggregationKey, Opportunity, Proposal};
use crate::storage::{
    error::{StorageError, StorageResult},
    traits::*,
    types::TranslationContributionRecord,
};

/// Locations of the files a run reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonlPaths {
    pub proposals: PathBuf,
    pub opportunities: PathBuf,
    pub output: PathBuf,
}

impl JsonlPaths {
    /// Summary file written next to the output
    pub fn summary(&self) -> PathBuf {
        self.output.with_extension("summary.json")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummaryRecord {
    pub records_produced: u64,
    pub records_stored: usize,
    pub completed_at: chrono::DateTime<Utc>,
}

pub struct JsonlStore {
    paths: JsonlPaths,
    records: RwLock<BTreeMap<String, TranslationContributionRecord>>,
}

impl JsonlStore {
    /// Open the store, loading records a previous run left in the output file.
    pub async fn open(paths: JsonlPaths) -> StorageResult<Self> {
        let mut records = BTreeMap::new();
        if fs::try_exists(&paths.output).await? {
            let content = fs::read_to_string(&paths.output).await?;
            for (idx, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let record: TranslationContributionRecord =
                    serde_json::from_str(line).map_err(|e| StorageError::MalformedRecord {
                        path: paths.output.clone(),
                        line: idx + 1,
                        message: e.to_string(),
                    })?;
                records.insert(record.id.clone(), record);
            }
            debug!(
                "Loaded {} existing records from {}",
                records.len(),
                paths.output.display()
            );
        }

        Ok(Self {
            paths,
            records: RwLock::new(records),
        })
    }

    pub async fn records(&self) -> Vec<TranslationContributionRecord> {
        self.records.read().await.values().cloned().collect()
    }

    async fn flush(&self) -> StorageResult<usize> {
        let records = self.records.read().await;
        let mut content = String::new();
        for record in records.values() {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }
        write_atomically(&self.paths.output, content.as_bytes()).await?;
        Ok(records.len())
    }
}

/// Read a JSON-lines file, skipping lines that do not decode.
pub async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    let content = fs::read_to_string(path).await?;
    let mut items = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                let err = StorageError::MalformedRecord {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: e.to_string(),
                };
                warn!("Skipping record: {}", err);
            }
        }
    }

    Ok(items)
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl RecordSource for JsonlStore {
    async fn read_proposals(&self, include_deleted: bool) -> StorageResult<Vec<Proposal>> {
        let proposals: Vec<Proposal> = read_jsonl(&self.paths.proposals).await?;
        Ok(proposals
            .into_iter()
            .filter(|p| include_deleted || !p.deleted)
            .collect())
    }

    async fn read_opportunities(&self, include_deleted: bool) -> StorageResult<Vec<Opportunity>> {
        let opportunities: Vec<Opportunity> = read_jsonl(&self.paths.opportunities).await?;
        Ok(opportunities
            .into_iter()
            .filter(|o| include_deleted || !o.deleted)
            .collect())
    }
}

#[async_trait]
impl AggregateSink for JsonlStore {
    async fn write_aggregate(
        &self,
        key: &AggregationKey,
        stats: &AggregateStats,
    ) -> StorageResult<()> {
        let record = TranslationContributionRecord::from_stats(key, stats, Utc::now());
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn report_run_summary(&self, records_produced: u64) -> StorageResult<()> {
        let records_stored = self.flush().await?;
        let summary = RunSummaryRecord {
            records_produced,
            records_stored,
            completed_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&summary)?;
        write_atomically(&self.paths.summary(), &json).await?;

        info!(
            "Wrote {} records ({} produced this run) to {}",
            records_stored,
            records_produced,
            self.paths.output.display()
        );
        Ok(())
    }
}
