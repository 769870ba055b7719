use thiserror::Error;

use crate::storage::error::StorageError;

/// Errors that fail a statistics run.
///
/// Malformed individual records never show up here; the deriver skips them
/// after logging. Everything in this enum aborts the run before any aggregate
/// is considered authoritative.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {stage}: {source}")]
    Read {
        stage: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("Duplicate opportunity id '{id}' appears {occurrences} times")]
    DuplicateOpportunity { id: String, occurrences: usize },

    #[error("Failed to write aggregate '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to report run summary: {0}")]
    Summary(#[source] StorageError),

    #[error("Aggregation key '{id}' cannot be stored: its id does not identify a unique key")]
    UnrepresentableKey { id: String },

    #[error("Aggregation worker failed: {0}")]
    Worker(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StatsError {
    /// Pipeline stage the error was raised in, for run diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            StatsError::Config(_) | StatsError::Toml(_) => "config",
            StatsError::Read { .. } => "read",
            StatsError::DuplicateOpportunity { .. } => "join",
            StatsError::Write { .. } => "materialize",
            StatsError::Summary(_) => "summary",
            StatsError::UnrepresentableKey { .. } | StatsError::Worker(_) => "aggregate",
        }
    }

    /// True for errors that point to corrupted inputs rather than a
    /// failing collaborator.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            StatsError::DuplicateOpportunity { .. } | StatsError::UnrepresentableKey { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
