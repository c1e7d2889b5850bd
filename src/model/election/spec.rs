use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::election::VotingType;

use super::ElectionError;

/// An election specification: everything the admin chooses at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Election title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Voting opens no earlier than this.
    pub start_time: DateTime<Utc>,
    /// Voting closes after this.
    pub end_time: DateTime<Utc>,
    pub voting_type: VotingType,
    /// Ignored for [`VotingType::SingleChoice`], which always allows exactly one.
    #[serde(default = "default_max_votes")]
    pub max_votes_per_voter: u32,
    /// Only registered voters may cast ballots.
    #[serde(default)]
    pub requires_registration: bool,
    /// Disclose tallies while the election is still running.
    #[serde(default)]
    pub results_visible: bool,
}

fn default_max_votes() -> u32 {
    1
}

impl ElectionSpec {
    /// Check the schedule and ballot size, relative to the processing time `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ElectionError> {
        if self.start_time <= now || self.end_time <= self.start_time {
            return Err(ElectionError::InvalidSchedule);
        }
        if self.voting_type == VotingType::MultipleChoice && self.max_votes_per_voter == 0 {
            return Err(ElectionError::InvalidMaxVotes);
        }
        Ok(())
    }

    /// The ballot size actually enforced.
    pub fn effective_max_votes(&self) -> u32 {
        match self.voting_type {
            VotingType::SingleChoice => 1,
            VotingType::MultipleChoice => self.max_votes_per_voter,
        }
    }
}
