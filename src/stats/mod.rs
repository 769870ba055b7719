//! Translation contribution statistics
//!
//! Proposals are joined with the opportunities they target, turned into one
//! [`StatEvent`] each, grouped by [`AggregationKey`] and reduced with the
//! associative [`StatsAccumulator`] into one [`AggregateStats`] per key.

pub mod aggregator;
pub mod deriver;
pub mod key;
pub mod markup;
pub mod pipeline;
pub mod types;


pub use aggregator::{parallel_merge, reduce_events, StatsAccumulator};
pub use deriver::{derive_event, derive_events, DeriveError};
pub use key::{AggregationKey, KeyParseError, KEY_DELIMITER};
pub use markup::{count_words, strip_markup};
pub use pipeline::{compute_stats, AggregationOutput, DerivationReport, PipelineOptions};
pub use types::{
    parse_last_updated, AggregateStats, Opportunity, Proposal, StatEvent, SuggestionStatus,
    SUGGESTION_TYPE_TRANSLATE_CONTENT,
};
