use serde::{Deserialize, Serialize};

use crate::model::common::{
    election::{CandidateId, Weight},
    identity::Identity,
};

use super::{gate, Election, ElectionError, ElectionEvent};

/// One identity's standing and history within one election.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub(super) is_registered: bool,
    pub(super) has_voted: bool,
    /// Zero for identities that were never registered.
    pub(super) weight: Weight,
    /// Candidates voted for, in ballot order.
    pub(super) choices: Vec<CandidateId>,
}

impl Voter {
    pub fn is_registered(&self) -> bool {
        self.is_registered
    }

    pub fn has_voted(&self) -> bool {
        self.has_voted
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn choices(&self) -> &[CandidateId] {
        &self.choices
    }

    pub fn status(&self) -> VoterStatus {
        VoterStatus {
            is_registered: self.is_registered,
            has_voted: self.has_voted,
            weight: self.weight,
        }
    }
}

/// The publicly readable part of a [`Voter`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterStatus {
    pub is_registered: bool,
    pub has_voted: bool,
    pub weight: Weight,
}

impl Election {
    /// Register `voter` with the given ballot weight.
    ///
    /// Allowed in any state; an identity that was removed earlier may be
    /// registered again as long as it has not voted.
    pub fn register_voter(
        &mut self,
        caller: &Identity,
        voter: Identity,
        weight: Weight,
    ) -> Result<ElectionEvent, ElectionError> {
        gate::ensure_admin(caller, self)?;
        if let Some(existing) = self.voters.get(&voter) {
            if existing.is_registered {
                return Err(ElectionError::AlreadyRegistered);
            }
            // Weight is frozen once a ballot has been cast.
            if existing.has_voted {
                return Err(ElectionError::AlreadyVoted);
            }
        }
        if weight == 0 {
            return Err(ElectionError::InvalidWeight);
        }

        let entry = self.voters.entry(voter.clone()).or_default();
        entry.is_registered = true;
        entry.weight = weight;
        Ok(ElectionEvent::VoterRegistered {
            election_id: self.id,
            voter,
            weight,
        })
    }

    /// Revoke a registration. Ballots already cast are irrevocable.
    pub fn remove_voter(
        &mut self,
        caller: &Identity,
        voter: &Identity,
    ) -> Result<ElectionEvent, ElectionError> {
        gate::ensure_admin(caller, self)?;
        let entry = self
            .voters
            .get_mut(voter)
            .filter(|v| v.is_registered)
            .ok_or(ElectionError::NotRegistered)?;
        if entry.has_voted {
            return Err(ElectionError::AlreadyVoted);
        }
        entry.is_registered = false;
        Ok(ElectionEvent::VoterRemoved {
            election_id: self.id,
            voter: voter.clone(),
        })
    }

    /// Unrestricted read. Unknown identities are unregistered, have not voted, and weigh 0.
    pub fn voter_status(&self, voter: &Identity) -> VoterStatus {
        self.voters
            .get(voter)
            .map(Voter::status)
            .unwrap_or_default()
    }

    pub fn voter(&self, voter: &Identity) -> Option<&Voter> {
        self.voters.get(voter)
    }

    /// Every identity with a record in this election, in identity order.
    pub fn voters(&self) -> impl Iterator<Item = (&Identity, &Voter)> {
        self.voters.iter()
    }

    /// A voter's choices, disclosed only to the voter, the election admin, or the registry owner.
    pub fn voter_choices(
        &self,
        caller: &Identity,
        owner: &Identity,
        voter: &Identity,
    ) -> Result<&[CandidateId], ElectionError> {
        if !self.can_view_choices(caller, owner, voter) {
            return Err(ElectionError::Unauthorized);
        }
        Ok(self.voters.get(voter).map(Voter::choices).unwrap_or(&[]))
    }
}
