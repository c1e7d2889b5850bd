//! Visibility Policy: when tallies and voter choices may be read.
//!
//! Masking only affects what readers see; the stored counts are never altered.

use crate::model::common::{
    election::{ElectionState, VoteCount},
    identity::Identity,
};

use super::{gate, Candidate, Election, ElectionEvent};

impl Election {
    /// Tallies are disclosed once the election has ended, or throughout if the
    /// admin chose visible results.
    pub fn results_disclosed(&self) -> bool {
        self.results_visible || self.state == ElectionState::Ended
    }

    /// The election total as a reader may see it: the true value, or 0.
    pub fn disclosed_total_votes(&self) -> VoteCount {
        self.mask(self.total_votes)
    }

    /// A candidate's count as a reader may see it: the true value, or 0.
    pub fn disclosed_vote_count(&self, candidate: &Candidate) -> VoteCount {
        self.mask(candidate.vote_count)
    }

    /// The true total, regardless of disclosure.
    pub fn total_votes(&self) -> VoteCount {
        self.total_votes
    }

    /// Voter choices are private to the voter, the election admin and the registry owner.
    pub fn can_view_choices(&self, caller: &Identity, owner: &Identity, voter: &Identity) -> bool {
        caller == voter || gate::is_admin(caller, self) || gate::is_owner(caller, owner)
    }

    /// Ballot notifications carry a voter's choices, so they follow the same rule.
    pub fn can_view_event(&self, caller: &Identity, owner: &Identity, event: &ElectionEvent) -> bool {
        match event {
            ElectionEvent::VoteCast { voter, .. } => self.can_view_choices(caller, owner, voter),
            _ => true,
        }
    }

    fn mask(&self, value: VoteCount) -> VoteCount {
        if self.results_disclosed() {
            value
        } else {
            0
        }
    }
}
