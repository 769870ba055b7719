use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stillwater::Validation;
use thiserror::Error;

use crate::stats::{PipelineOptions, SUGGESTION_TYPE_TRANSLATE_CONTENT};
use crate::storage::JsonlPaths;

pub mod loader;

pub use loader::{load_config, ConfigOverrides};

pub const ENV_THREADS: &str = "CONTRIB_STATS_THREADS";
pub const ENV_LOG_LEVEL: &str = "CONTRIB_STATS_LOG_LEVEL";
pub const ENV_INCLUDE_DELETED: &str = "CONTRIB_STATS_INCLUDE_DELETED";

/// A single problem found while validating [`StatsConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("suggestion_type must not be empty")]
    EmptySuggestionType,

    #[error("threads must be at least 1")]
    ZeroThreads,

    #[error("output path '{}' is also an input file", .0.display())]
    OutputIsInput(PathBuf),
}

/// Validation result that accumulates every error instead of stopping at the first
pub type ConfigValidation<T> = Validation<T, Vec<ConfigValidationError>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Proposal type that is aggregated
    pub suggestion_type: String,
    /// Also read records flagged as deleted
    pub include_deleted: bool,
    /// Worker threads for aggregation; unset uses one per core
    pub threads: Option<usize>,
    pub log_level: Option<String>,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub proposals: PathBuf,
    pub opportunities: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            suggestion_type: SUGGESTION_TYPE_TRANSLATE_CONTENT.to_string(),
            include_deleted: false,
            threads: None,
            log_level: None,
            input: InputConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            proposals: PathBuf::from("proposals.jsonl"),
            opportunities: PathBuf::from("opportunities.jsonl"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("translation_contribution_stats.jsonl"),
        }
    }
}

impl StatsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `CONTRIB_STATS_*` environment variables.
    pub fn merge_env_vars(&mut self) {
        self.merge_env_with(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparsable values are ignored with a warning so a stray variable does
    /// not stop a scheduled run.
    pub fn merge_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(threads) = lookup(ENV_THREADS) {
            match threads.parse::<usize>() {
                Ok(value) => self.threads = Some(value),
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", ENV_THREADS, threads),
            }
        }

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = Some(log_level);
        }

        if let Some(include_deleted) = lookup(ENV_INCLUDE_DELETED) {
            match include_deleted.parse::<bool>() {
                Ok(value) => self.include_deleted = value,
                Err(_) => tracing::warn!(
                    "Ignoring invalid {}: {}",
                    ENV_INCLUDE_DELETED,
                    include_deleted
                ),
            }
        }
    }

    pub fn validate(&self) -> ConfigValidation<()> {
        let mut errors = Vec::new();

        if self.suggestion_type.trim().is_empty() {
            errors.push(ConfigValidationError::EmptySuggestionType);
        }
        if self.threads == Some(0) {
            errors.push(ConfigValidationError::ZeroThreads);
        }
        if self.output.path == self.input.proposals || self.output.path == self.input.opportunities
        {
            errors.push(ConfigValidationError::OutputIsInput(self.output.path.clone()));
        }

        if errors.is_empty() {
            Validation::success(())
        } else {
            Validation::failure(errors)
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            suggestion_type: self.suggestion_type.clone(),
            threads: self.threads,
        }
    }

    pub fn jsonl_paths(&self) -> JsonlPaths {
        JsonlPaths {
            proposals: self.input.proposals.clone(),
            opportunities: self.input.opportunities.clone(),
            output: self.output.path.clone(),
        }
    }
}
