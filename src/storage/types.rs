//! Persisted record layout

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::{AggregateStats, AggregationKey, KeyParseError};

/// Stored form of one key's statistics.
///
/// Field names follow the layout earlier runs wrote, so a new run can
/// overwrite those records in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContributionRecord {
    /// Canonical key, `language.contributor.topic`
    pub id: String,
    pub language_code: String,
    pub contributor_user_id: String,
    pub topic_id: String,
    pub submitted_translations_count: u64,
    pub submitted_translation_word_count: u64,
    pub accepted_translations_count: u64,
    pub accepted_translations_without_reviewer_edits_count: u64,
    pub accepted_translation_word_count: u64,
    pub rejected_translations_count: u64,
    pub rejected_translation_word_count: u64,
    pub contribution_dates: Vec<NaiveDate>,
    /// When this record was last materialized
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
}

impl TranslationContributionRecord {
    pub fn from_stats(
        key: &AggregationKey,
        stats: &AggregateStats,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            id: key.to_string(),
            language_code: stats.language_code.clone(),
            contributor_user_id: stats.contributor_id.clone(),
            topic_id: stats.topic_id.clone(),
            submitted_translations_count: stats.submitted_count,
            submitted_translation_word_count: stats.submitted_word_count,
            accepted_translations_count: stats.accepted_count,
            accepted_translations_without_reviewer_edits_count: stats.accepted_no_edit_count,
            accepted_translation_word_count: stats.accepted_word_count,
            rejected_translations_count: stats.rejected_count,
            rejected_translation_word_count: stats.rejected_word_count,
            contribution_dates: stats.contribution_dates.iter().copied().collect(),
            last_updated,
        }
    }

    /// Key recovered from the stored id
    pub fn key(&self) -> Result<AggregationKey, KeyParseError> {
        self.id.parse()
    }

    pub fn into_stats(self) -> AggregateStats {
        AggregateStats {
            language_code: self.language_code,
            contributor_id: self.contributor_user_id,
            topic_id: self.topic_id,
            submitted_count: self.submitted_translations_count,
            submitted_word_count: self.submitted_translation_word_count,
            accepted_count: self.accepted_translations_count,
            accepted_no_edit_count: self.accepted_translations_without_reviewer_edits_count,
            accepted_word_count: self.accepted_translation_word_count,
            rejected_count: self.rejected_translations_count,
            rejected_word_count: self.rejected_translation_word_count,
            contribution_dates: self.contribution_dates.into_iter().collect(),
        }
    }
}
