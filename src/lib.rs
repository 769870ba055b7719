//! # contrib-stats
//!
//! Batch computation of per-contributor, per-topic, per-language translation
//! contribution statistics.
//!
//! ## Usage
//!
//! ```bash
//! contrib-stats run [-c config.toml] [--proposals p.jsonl] [--opportunities o.jsonl] [--output out.jsonl]
//! ```
//!
//! ## Modules
//!
//! - `stats` - Event derivation, aggregation key, associative combiner and the join/group pipeline
//! - `storage` - Record source and aggregate sink collaborators (in-memory and JSON-lines)
//! - `job` - Run driver: read, aggregate, materialize, report
//! - `config` - TOML configuration with environment overrides
//! - `error` - Run-level error type
pub mod config;
pub mod error;
pub mod job;
pub mod stats;
pub mod storage;

pub use error::{Result, StatsError};
pub use job::{RunOutcome, RunSummary, StatsJob};
