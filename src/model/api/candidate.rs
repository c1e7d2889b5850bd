use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{CandidateId, VoteCount},
    election::{Candidate, Election},
};

/// A new candidate, as submitted by the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A candidate as readers see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateView {
    pub id: CandidateId,
    pub name: String,
    pub description: String,
    /// Zero until results are disclosed.
    pub vote_count: VoteCount,
}

impl CandidateView {
    /// View `candidate` through `election`'s visibility policy.
    pub fn new(candidate: &Candidate, election: &Election) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            description: candidate.description.clone(),
            vote_count: election.disclosed_vote_count(candidate),
        }
    }
}
