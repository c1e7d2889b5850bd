use serde::{Deserialize, Serialize};

use crate::model::common::{
    election::{CandidateId, ElectionState, VoteCount},
    identity::Identity,
};

use super::{gate, Election, ElectionError, ElectionEvent};

/// A selectable option within one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub description: String,
    /// True weighted count, regardless of disclosure.
    pub(super) vote_count: VoteCount,
}

impl Candidate {
    /// The true accumulated count. Readers outside the election should go through
    /// [`Election::disclosed_vote_count`] instead.
    pub fn vote_count(&self) -> VoteCount {
        self.vote_count
    }
}

impl Election {
    /// Append a candidate. Only possible before the election starts.
    pub fn add_candidate(
        &mut self,
        caller: &Identity,
        name: String,
        description: String,
    ) -> Result<(CandidateId, ElectionEvent), ElectionError> {
        gate::ensure_admin(caller, self)?;
        if self.state != ElectionState::Created {
            return Err(ElectionError::ElectionAlreadyStarted);
        }
        let id = self.candidate_count() + 1;
        let event = ElectionEvent::CandidateAdded {
            election_id: self.id,
            candidate_id: id,
            name: name.clone(),
        };
        self.candidates.push(Candidate {
            id,
            name,
            description,
            vote_count: 0,
        });
        Ok((id, event))
    }

    pub fn candidate_count(&self) -> u32 {
        // Candidate IDs are u32, so the list can never outgrow one.
        self.candidates.len() as u32
    }

    /// Look up a candidate by its 1-based ID.
    pub fn candidate(&self, id: CandidateId) -> Result<&Candidate, ElectionError> {
        self.candidate_index(id).map(|i| &self.candidates[i])
    }

    /// All candidates, in ID order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub(super) fn candidate_index(&self, id: CandidateId) -> Result<usize, ElectionError> {
        if (1..=self.candidate_count()).contains(&id) {
            Ok(id as usize - 1)
        } else {
            Err(ElectionError::InvalidCandidate(id))
        }
    }
}
