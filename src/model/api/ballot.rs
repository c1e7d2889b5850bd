use serde::{Deserialize, Serialize};

use crate::model::common::election::CandidateId;

/// A single-choice ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleBallot {
    pub candidate_id: CandidateId,
}

/// A multiple-choice ballot. Order is preserved in the voter's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleBallot {
    pub candidate_ids: Vec<CandidateId>,
}
