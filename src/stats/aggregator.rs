//! Associative combiner for contribution statistics
//!
//! [`StatsAccumulator`] is an immutable value: `fold` and `merge` consume their
//! inputs and return a new accumulator. `merge` is associative and commutative
//! and `identity(key)` is its neutral element, so partial results may be
//! combined in any grouping or order (sequentially, per worker, or as a rayon
//! tree reduction) and still produce the same [`AggregateStats`].

use rayon::prelude::*;
use stillwater::Semigroup;

use super::key::AggregationKey;
use super::types::{AggregateStats, StatEvent, SuggestionStatus};

/// In-progress statistics for a single aggregation key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsAccumulator {
    stats: AggregateStats,
}

impl StatsAccumulator {
    /// Zero-valued accumulator for `key`.
    pub fn identity(key: &AggregationKey) -> Self {
        Self {
            stats: AggregateStats::empty(key),
        }
    }

    /// Add one event. Each event must be folded exactly once.
    pub fn fold(self, event: &StatEvent) -> Self {
        let mut stats = self.stats;
        let words = event.content_word_count;

        stats.submitted_count += 1;
        stats.submitted_word_count += words;

        match event.suggestion_status {
            SuggestionStatus::Accepted => {
                stats.accepted_count += 1;
                stats.accepted_word_count += words;
                if !event.edited_by_reviewer {
                    stats.accepted_no_edit_count += 1;
                }
            }
            SuggestionStatus::Rejected => {
                stats.rejected_count += 1;
                stats.rejected_word_count += words;
            }
            SuggestionStatus::InReview | SuggestionStatus::Other => {}
        }

        stats.contribution_dates.insert(event.last_updated_date);
        Self { stats }
    }

    /// Field-wise sum of counters and union of contribution dates.
    ///
    /// # Panics
    ///
    /// Panics if the two accumulators belong to different keys. Grouping
    /// guarantees this never happens; a mismatch means a grouping bug and
    /// continuing would silently corrupt both aggregates.
    pub fn merge(self, other: Self) -> Self {
        let mut a = self.stats;
        let b = other.stats;

        assert!(
            a.language_code == b.language_code
                && a.contributor_id == b.contributor_id
                && a.topic_id == b.topic_id,
            "Cannot merge statistics for different keys: {} and {}",
            a.key(),
            b.key()
        );

        a.submitted_count += b.submitted_count;
        a.submitted_word_count += b.submitted_word_count;
        a.accepted_count += b.accepted_count;
        a.accepted_no_edit_count += b.accepted_no_edit_count;
        a.accepted_word_count += b.accepted_word_count;
        a.rejected_count += b.rejected_count;
        a.rejected_word_count += b.rejected_word_count;
        a.contribution_dates.extend(b.contribution_dates);

        Self { stats: a }
    }

    /// Finish the reduction and hand out the statistics.
    pub fn extract(self) -> AggregateStats {
        debug_assert!(
            self.stats.is_consistent(),
            "inconsistent statistics for {}",
            self.stats.key()
        );
        self.stats
    }

    pub fn key(&self) -> AggregationKey {
        self.stats.key()
    }
}

impl Semigroup for StatsAccumulator {
    fn combine(self, other: Self) -> Self {
        self.merge(other)
    }
}

/// Sequentially fold all events of one key.
pub fn reduce_events<'a, I>(key: &AggregationKey, events: I) -> StatsAccumulator
where
    I: IntoIterator<Item = &'a StatEvent>,
{
    events
        .into_iter()
        .fold(StatsAccumulator::identity(key), StatsAccumulator::fold)
}

/// Merge partial accumulators of one key with a rayon tree reduction.
///
/// Returns `None` for an empty input.
pub fn parallel_merge(partials: Vec<StatsAccumulator>) -> Option<StatsAccumulator> {
    partials.into_par_iter().reduce_with(StatsAccumulator::combine)
}
