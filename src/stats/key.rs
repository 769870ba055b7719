//! Composite aggregation key
//!
//! Statistics are grouped by `(language, contributor, topic)`. The key is kept
//! as three typed fields for hashing and comparison; the dotted string form is
//! only produced at the persistence boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::types::{Opportunity, Proposal};

/// Separator between key components in the canonical id.
pub const KEY_DELIMITER: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregationKey {
    pub language_code: String,
    pub contributor_id: String,
    /// Empty when the proposal matched no opportunity
    pub topic_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid aggregation key '{0}': expected language.contributor.topic")]
pub struct KeyParseError(pub String);

impl AggregationKey {
    pub fn new(language_code: &str, contributor_id: &str, topic_id: &str) -> Self {
        Self {
            language_code: language_code.to_string(),
            contributor_id: contributor_id.to_string(),
            topic_id: topic_id.to_string(),
        }
    }

    /// Build the key for a proposal and the opportunity it was joined with.
    ///
    /// An unmatched proposal is still attributed to its language and author,
    /// just without a topic.
    pub fn for_proposal(proposal: &Proposal, opportunity: Option<&Opportunity>) -> Self {
        let topic_id = opportunity.map(|o| o.topic_id.as_str()).unwrap_or("");
        Self::new(&proposal.language_code, &proposal.author_id, topic_id)
    }

    /// Whether the canonical id parses back into this same key.
    ///
    /// Fails for components containing the delimiter and for an empty
    /// language or contributor.
    pub fn round_trips(&self) -> bool {
        matches!(self.to_string().parse::<AggregationKey>(), Ok(parsed) if parsed == *self)
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.language_code, KEY_DELIMITER, self.contributor_id, KEY_DELIMITER, self.topic_id
        )
    }
}

impl FromStr for AggregationKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(KEY_DELIMITER).collect();
        match parts.as_slice() {
            [language, contributor, topic] if !language.is_empty() && !contributor.is_empty() => {
                Ok(Self::new(language, contributor, topic))
            }
            _ => Err(KeyParseError(s.to_string())),
        }
    }
}
