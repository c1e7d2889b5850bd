use std::fmt::{Display, Formatter};

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{
    election::{CandidateId, ElectionId, ElectionState, Weight},
    identity::Identity,
};

/// An observable notification emitted by a successful election operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElectionEvent {
    ElectionCreated {
        election_id: ElectionId,
        admin: Identity,
        title: String,
    },
    CandidateAdded {
        election_id: ElectionId,
        candidate_id: CandidateId,
        name: String,
    },
    VoterRegistered {
        election_id: ElectionId,
        voter: Identity,
        weight: Weight,
    },
    VoterRemoved {
        election_id: ElectionId,
        voter: Identity,
    },
    VoteCast {
        election_id: ElectionId,
        voter: Identity,
        candidate_id: CandidateId,
        weight: Weight,
    },
    StateChanged {
        election_id: ElectionId,
        state: ElectionState,
    },
}

impl ElectionEvent {
    pub fn election_id(&self) -> ElectionId {
        match self {
            Self::ElectionCreated { election_id, .. }
            | Self::CandidateAdded { election_id, .. }
            | Self::VoterRegistered { election_id, .. }
            | Self::VoterRemoved { election_id, .. }
            | Self::VoteCast { election_id, .. }
            | Self::StateChanged { election_id, .. } => *election_id,
        }
    }
}

impl Display for ElectionEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ElectionCreated {
                election_id,
                admin,
                title,
            } => write!(f, "election {election_id} '{title}' created by {admin}"),
            Self::CandidateAdded {
                election_id,
                candidate_id,
                name,
            } => write!(
                f,
                "election {election_id}: candidate {candidate_id} '{name}' added"
            ),
            Self::VoterRegistered {
                election_id,
                voter,
                weight,
            } => write!(
                f,
                "election {election_id}: voter {voter} registered with weight {weight}"
            ),
            Self::VoterRemoved { election_id, voter } => {
                write!(f, "election {election_id}: voter {voter} removed")
            }
            Self::VoteCast {
                election_id,
                voter,
                candidate_id,
                weight,
            } => write!(
                f,
                "election {election_id}: {voter} cast {weight} vote(s) for candidate {candidate_id}"
            ),
            Self::StateChanged { election_id, state } => {
                write!(f, "election {election_id}: state is now {state}")
            }
        }
    }
}

/// A committed notification, in the per-election order it was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub election_id: ElectionId,
    /// Position in the election's notification log, starting at 1.
    pub sequence: u64,
    #[serde(with = "ts_milliseconds")]
    pub at: DateTime<Utc>,
    pub event: ElectionEvent,
}

impl EventRecord {
    pub fn new(sequence: u64, at: DateTime<Utc>, event: ElectionEvent) -> Self {
        Self {
            election_id: event.election_id(),
            sequence,
            at,
            event,
        }
    }
}
