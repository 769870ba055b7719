//! Per-proposal statistic events
//!
//! Pure transformation from a target's proposals (plus the opportunity they
//! were joined with, if any) to keyed [`StatEvent`]s. A record that cannot be
//! turned into an event is logged and skipped; it never fails the run.

use thiserror::Error;
use tracing::warn;

use super::key::AggregationKey;
use super::markup::count_words;
use super::types::{parse_last_updated, Opportunity, Proposal, StatEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("proposal '{proposal_id}' has unparsable last_updated '{raw}'")]
    InvalidTimestamp { proposal_id: String, raw: String },
}

/// Derive the keyed event for a single proposal.
pub fn derive_event(
    proposal: &Proposal,
    opportunity: Option<&Opportunity>,
) -> Result<(AggregationKey, StatEvent), DeriveError> {
    let last_updated_date =
        parse_last_updated(&proposal.last_updated).ok_or_else(|| DeriveError::InvalidTimestamp {
            proposal_id: proposal.id.clone(),
            raw: proposal.last_updated.clone(),
        })?;

    let event = StatEvent {
        suggestion_status: proposal.status,
        edited_by_reviewer: proposal.edited_by_reviewer,
        content_word_count: count_words(&proposal.content_html),
        last_updated_date,
    };

    Ok((AggregationKey::for_proposal(proposal, opportunity), event))
}

/// Lazily derive events for every proposal of one target.
///
/// Yields at most one pair per proposal; proposals whose timestamp cannot be
/// parsed are dropped with a warning.
pub fn derive_events<'a>(
    proposals: &'a [Proposal],
    opportunity: Option<&'a Opportunity>,
) -> impl Iterator<Item = (AggregationKey, StatEvent)> + 'a {
    proposals
        .iter()
        .filter_map(move |proposal| match derive_event(proposal, opportunity) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("Skipping proposal: {}", e);
                None
            }
        })
}
