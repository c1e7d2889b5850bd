use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        election::{ElectionId, ElectionState, VoteCount, VotingType},
        identity::Identity,
    },
    election::Election,
};

/// An API-friendly election description, with tallies masked per the visibility policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionInfo {
    /// Election unique ID.
    pub id: ElectionId,
    pub title: String,
    pub description: String,
    /// Identity of the creator, who administers the election.
    pub admin: Identity,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub state: ElectionState,
    pub voting_type: VotingType,
    pub max_votes_per_voter: u32,
    /// Zero until results are disclosed.
    pub total_votes: VoteCount,
    pub candidate_count: u32,
    pub requires_registration: bool,
    pub results_visible: bool,
}

impl From<&Election> for ElectionInfo {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id(),
            title: election.title().to_string(),
            description: election.description().to_string(),
            admin: election.admin().clone(),
            start_time: election.start_time(),
            end_time: election.end_time(),
            state: election.state(),
            voting_type: election.voting_type(),
            max_votes_per_voter: election.max_votes_per_voter(),
            total_votes: election.disclosed_total_votes(),
            candidate_count: election.candidate_count(),
            requires_registration: election.requires_registration(),
            results_visible: election.results_visible(),
        }
    }
}

/// A summary of an election, shorter than the full `ElectionInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    /// Election unique ID.
    pub id: ElectionId,
    pub title: String,
    pub state: ElectionState,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&Election> for ElectionSummary {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id(),
            title: election.title().to_string(),
            state: election.state(),
            start_time: election.start_time(),
            end_time: election.end_time(),
        }
    }
}
