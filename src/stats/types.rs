//! Record types consumed and produced by the statistics pipeline

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::key::AggregationKey;

/// Suggestion type carried by translation proposals.
pub const SUGGESTION_TYPE_TRANSLATE_CONTENT: &str = "translate_content";

/// Review status of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[serde(alias = "ACCEPTED")]
    Accepted,
    #[serde(alias = "REJECTED")]
    Rejected,
    #[serde(rename = "review", alias = "REVIEW")]
    InReview,
    #[serde(other)]
    Other,
}

/// A submitted change proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Suggestion id, only used in diagnostics
    #[serde(default)]
    pub id: String,
    pub suggestion_type: String,
    /// Id of the opportunity this proposal was submitted against
    pub target_id: String,
    pub language_code: String,
    pub author_id: String,
    pub status: SuggestionStatus,
    #[serde(default)]
    pub edited_by_reviewer: bool,
    #[serde(default)]
    pub content_html: String,
    /// Raw timestamp text; parsed by [`parse_last_updated`]
    pub last_updated: String,
    #[serde(default)]
    pub deleted: bool,
}

/// A content opportunity proposals are submitted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    #[serde(default)]
    pub topic_id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// One derived statistic per proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEvent {
    pub suggestion_status: SuggestionStatus,
    pub edited_by_reviewer: bool,
    pub content_word_count: u64,
    pub last_updated_date: NaiveDate,
}

/// Finished statistics for one aggregation key.
///
/// Only [`StatsAccumulator`](super::aggregator::StatsAccumulator) builds
/// these; once extracted they are read-only values handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub language_code: String,
    pub contributor_id: String,
    pub topic_id: String,
    pub submitted_count: u64,
    pub submitted_word_count: u64,
    pub accepted_count: u64,
    pub accepted_no_edit_count: u64,
    pub accepted_word_count: u64,
    pub rejected_count: u64,
    pub rejected_word_count: u64,
    pub contribution_dates: BTreeSet<NaiveDate>,
}

impl AggregateStats {
    /// Zero-valued statistics for a key
    pub fn empty(key: &AggregationKey) -> Self {
        Self {
            language_code: key.language_code.clone(),
            contributor_id: key.contributor_id.clone(),
            topic_id: key.topic_id.clone(),
            submitted_count: 0,
            submitted_word_count: 0,
            accepted_count: 0,
            accepted_no_edit_count: 0,
            accepted_word_count: 0,
            rejected_count: 0,
            rejected_word_count: 0,
            contribution_dates: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> AggregationKey {
        AggregationKey::new(&self.language_code, &self.contributor_id, &self.topic_id)
    }

    /// Check the counter relationships every reachable value satisfies.
    pub fn is_consistent(&self) -> bool {
        self.accepted_no_edit_count <= self.accepted_count
            && self.accepted_count + self.rejected_count <= self.submitted_count
            && self.accepted_word_count <= self.submitted_word_count
            && self.rejected_word_count <= self.submitted_word_count
            && self.contribution_dates.len() as u64 <= self.submitted_count
    }
}

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a proposal's `last_updated` text into its calendar date.
///
/// Offsets are honoured as written: the date is the one in the timestamp's
/// own offset, matching how the value was recorded upstream.
pub fn parse_last_updated(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
