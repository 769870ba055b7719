//! Run driver for the contribution statistics job
//!
//! A run reads a full snapshot of both record sets, aggregates it on a
//! blocking worker, and only then writes results. Nothing reaches the sink
//! until every key's reduction has finished, so a run that fails or is
//! dropped mid-way never writes partially reduced statistics.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::config::StatsConfig;
use crate::error::{Result, StatsError};
use crate::stats::{compute_stats, DerivationReport, PipelineOptions};
use crate::storage::{AggregateSink, RecordSource};

/// What a successful run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Produced(u64),
    /// Nothing matched; a valid outcome, not a failure
    NoRecords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub records_produced: u64,
    pub report: DerivationReport,
}

impl RunSummary {
    pub fn outcome(&self) -> RunOutcome {
        match self.records_produced {
            0 => RunOutcome::NoRecords,
            n => RunOutcome::Produced(n),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SUCCESS {}", self.records_produced)
    }
}

pub struct StatsJob {
    options: PipelineOptions,
    include_deleted: bool,
}

impl StatsJob {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            include_deleted: false,
        }
    }

    pub fn from_config(config: &StatsConfig) -> Self {
        Self {
            options: config.pipeline_options(),
            include_deleted: config.include_deleted,
        }
    }

    /// Also read records flagged as deleted
    pub fn include_deleted(mut self, include_deleted: bool) -> Self {
        self.include_deleted = include_deleted;
        self
    }

    /// Execute one run.
    ///
    /// Writes each finished aggregate exactly once and reports the summary
    /// after the last write. Any read, aggregation or write failure aborts
    /// the run with the stage (and key, for writes) that failed.
    pub async fn run(
        &self,
        source: &dyn RecordSource,
        sink: &dyn AggregateSink,
    ) -> Result<RunSummary> {
        let proposals = source
            .read_proposals(self.include_deleted)
            .await
            .map_err(|source| StatsError::Read {
                stage: "proposals",
                source,
            })?;
        let opportunities = source
            .read_opportunities(self.include_deleted)
            .await
            .map_err(|source| StatsError::Read {
                stage: "opportunities",
                source,
            })?;
        info!(
            "Read {} proposals and {} opportunities",
            proposals.len(),
            opportunities.len()
        );

        let options = self.options.clone();
        let output =
            tokio::task::spawn_blocking(move || compute_stats(proposals, opportunities, &options))
                .await
                .map_err(|e| StatsError::Worker(e.to_string()))??;

        let mut records_produced = 0u64;
        for stats in &output.aggregates {
            let key = stats.key();
            sink.write_aggregate(&key, stats)
                .await
                .map_err(|source| StatsError::Write {
                    key: key.to_string(),
                    source,
                })?;
            records_produced += 1;
        }

        sink.report_run_summary(records_produced)
            .await
            .map_err(StatsError::Summary)?;

        let summary = RunSummary {
            records_produced,
            report: output.report,
        };
        match summary.outcome() {
            RunOutcome::Produced(n) => info!("Produced {} aggregate records", n),
            RunOutcome::NoRecords => info!("No aggregate records produced"),
        }

        Ok(summary)
    }
}
