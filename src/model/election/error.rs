use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::election::{CandidateId, ElectionId, ElectionState};

/// The broad category of a rejected call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The caller lacks the required standing.
    Authorization,
    /// A referenced election or candidate does not exist.
    Existence,
    /// Wrong lifecycle state or outside the voting window.
    State,
    /// Malformed input.
    Validation,
    /// The voter may not perform this action.
    Eligibility,
}

/// A typed rejection of a single election operation.
///
/// Every rejection leaves the election exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    #[error("caller is not permitted to perform this operation")]
    Unauthorized,
    #[error("election {0} does not exist")]
    ElectionNotFound(ElectionId),
    #[error("candidate {0} does not exist")]
    InvalidCandidate(CandidateId),
    #[error("start time must be in the future and before the end time")]
    InvalidSchedule,
    #[error("max votes per voter must be at least 1")]
    InvalidMaxVotes,
    #[error("election is not ready to start")]
    NotReady,
    #[error("election end time has passed")]
    ScheduleExpired,
    #[error("candidates cannot be added once the election has started")]
    ElectionAlreadyStarted,
    #[error("cannot move election from {from} to {to}")]
    InvalidTransition {
        from: ElectionState,
        to: ElectionState,
    },
    #[error("election is not accepting votes")]
    ElectionNotActive,
    #[error("voter is not registered")]
    VoterNotRegistered,
    #[error("voter is already registered")]
    AlreadyRegistered,
    #[error("voter is not registered")]
    NotRegistered,
    #[error("voter has already voted")]
    AlreadyVoted,
    #[error("voter weight must be positive")]
    InvalidWeight,
    #[error("operation does not match the election's voting type")]
    WrongVotingType,
    #[error("ballot selects more candidates than permitted")]
    TooManyChoices,
    #[error("ballot selects no candidates")]
    EmptyBallot,
    #[error("candidate {0} selected more than once")]
    DuplicateChoice(CandidateId),
    #[error("vote tally would overflow")]
    TallyOverflow,
    #[error("results have not been disclosed yet")]
    ResultsHidden,
}

impl ElectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Authorization,
            Self::ElectionNotFound(_) | Self::InvalidCandidate(_) => ErrorKind::Existence,
            Self::NotReady
            | Self::ScheduleExpired
            | Self::ElectionAlreadyStarted
            | Self::InvalidTransition { .. }
            | Self::ElectionNotActive
            | Self::ResultsHidden => ErrorKind::State,
            Self::InvalidSchedule
            | Self::InvalidMaxVotes
            | Self::InvalidWeight
            | Self::WrongVotingType
            | Self::TooManyChoices
            | Self::EmptyBallot
            | Self::DuplicateChoice(_)
            | Self::TallyOverflow => ErrorKind::Validation,
            Self::VoterNotRegistered
            | Self::AlreadyRegistered
            | Self::NotRegistered
            | Self::AlreadyVoted => ErrorKind::Eligibility,
        }
    }
}
