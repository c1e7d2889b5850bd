//! Ballot processing: validating and applying single- and multiple-choice votes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::model::common::{
    election::{CandidateId, VoteCount, VotingType, Weight},
    identity::Identity,
};

use super::{Election, ElectionError, ElectionEvent};

impl Election {
    /// Cast a ballot for a single candidate. Valid for both voting types.
    pub fn cast_vote(
        &mut self,
        voter: &Identity,
        candidate_id: CandidateId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ElectionEvent>, ElectionError> {
        self.ensure_accepting_votes(now)?;
        let weight = self.ballot_weight(voter)?;
        self.candidate_index(candidate_id)?;
        self.apply_ballot(voter, &[candidate_id], weight)
    }

    /// Cast a ballot for several distinct candidates. `MultipleChoice` elections only.
    ///
    /// The voter's full weight is applied to every selected candidate.
    pub fn cast_multiple_votes(
        &mut self,
        voter: &Identity,
        candidate_ids: &[CandidateId],
        now: DateTime<Utc>,
    ) -> Result<Vec<ElectionEvent>, ElectionError> {
        self.ensure_accepting_votes(now)?;
        if self.voting_type != VotingType::MultipleChoice {
            return Err(ElectionError::WrongVotingType);
        }
        if candidate_ids.len() > self.max_votes_per_voter as usize {
            return Err(ElectionError::TooManyChoices);
        }
        if candidate_ids.is_empty() {
            return Err(ElectionError::EmptyBallot);
        }
        let weight = self.ballot_weight(voter)?;
        let mut seen = HashSet::with_capacity(candidate_ids.len());
        for &id in candidate_ids {
            self.candidate_index(id)?;
            if !seen.insert(id) {
                return Err(ElectionError::DuplicateChoice(id));
            }
        }
        self.apply_ballot(voter, candidate_ids, weight)
    }

    fn ensure_accepting_votes(&self, now: DateTime<Utc>) -> Result<(), ElectionError> {
        if self.is_accepting_votes(now) {
            Ok(())
        } else {
            Err(ElectionError::ElectionNotActive)
        }
    }

    /// Check eligibility and work out the weight this voter's ballot carries.
    fn ballot_weight(&self, voter: &Identity) -> Result<Weight, ElectionError> {
        let record = self.voters.get(voter);
        let registered = record.map_or(false, |v| v.is_registered);
        // A removed voter keeps its weight but loses the right to vote, even
        // where registration is otherwise optional.
        let removed = record.map_or(false, |v| !v.is_registered && v.weight > 0);
        if removed || (self.requires_registration && !registered) {
            return Err(ElectionError::VoterNotRegistered);
        }
        if record.map_or(false, |v| v.has_voted) {
            return Err(ElectionError::AlreadyVoted);
        }
        // Identities never registered (open elections) count once.
        Ok(record.map(|v| v.weight).filter(|w| *w > 0).unwrap_or(1))
    }

    /// Apply an already validated ballot. Tallies are computed up front so an
    /// overflow rejects the ballot before anything changes.
    fn apply_ballot(
        &mut self,
        voter: &Identity,
        choices: &[CandidateId],
        weight: Weight,
    ) -> Result<Vec<ElectionEvent>, ElectionError> {
        let added = VoteCount::from(weight);
        let total_added = added
            .checked_mul(choices.len() as VoteCount)
            .ok_or(ElectionError::TallyOverflow)?;
        let new_total = self
            .total_votes
            .checked_add(total_added)
            .ok_or(ElectionError::TallyOverflow)?;
        let mut new_counts = Vec::with_capacity(choices.len());
        for &id in choices {
            let index = self.candidate_index(id)?;
            let count = self.candidates[index]
                .vote_count
                .checked_add(added)
                .ok_or(ElectionError::TallyOverflow)?;
            new_counts.push((index, count));
        }

        for (index, count) in new_counts {
            self.candidates[index].vote_count = count;
        }
        self.total_votes = new_total;
        let record = self.voters.entry(voter.clone()).or_default();
        record.has_voted = true;
        record.choices.extend_from_slice(choices);

        Ok(choices
            .iter()
            .map(|&candidate_id| ElectionEvent::VoteCast {
                election_id: self.id,
                voter: voter.clone(),
                candidate_id,
                weight,
            })
            .collect())
    }
}
