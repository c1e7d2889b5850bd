use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{
    election::{ElectionId, ElectionState, VoteCount, VotingType},
    identity::Identity,
};

use super::{
    candidate::Candidate, gate, spec::ElectionSpec, voter::Voter, ElectionError, ElectionEvent,
};

/// An election cannot start with fewer candidates than this.
pub const MIN_CANDIDATES: usize = 2;

/// A single election with its candidates and voters, as stored.
///
/// All mutation goes through the methods on this type, each of which either
/// applies fully or returns an error without touching anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub(super) id: ElectionId,
    pub(super) title: String,
    pub(super) description: String,
    pub(super) admin: Identity,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub(super) start_time: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub(super) end_time: DateTime<Utc>,
    pub(super) state: ElectionState,
    pub(super) voting_type: VotingType,
    pub(super) max_votes_per_voter: u32,
    /// True weighted total, regardless of disclosure.
    pub(super) total_votes: VoteCount,
    pub(super) requires_registration: bool,
    pub(super) results_visible: bool,
    /// Candidate `n` lives at index `n - 1`.
    pub(super) candidates: Vec<Candidate>,
    pub(super) voters: BTreeMap<Identity, Voter>,
}

impl Election {
    /// Create a new election in the `Created` state, administered by `admin`.
    pub fn create(
        id: ElectionId,
        admin: Identity,
        spec: ElectionSpec,
        now: DateTime<Utc>,
    ) -> Result<(Self, ElectionEvent), ElectionError> {
        spec.validate(now)?;
        let max_votes_per_voter = spec.effective_max_votes();
        let election = Self {
            id,
            title: spec.title,
            description: spec.description,
            admin,
            start_time: spec.start_time,
            end_time: spec.end_time,
            state: ElectionState::Created,
            voting_type: spec.voting_type,
            max_votes_per_voter,
            total_votes: 0,
            requires_registration: spec.requires_registration,
            results_visible: spec.results_visible,
            candidates: Vec::new(),
            voters: BTreeMap::new(),
        };
        let event = ElectionEvent::ElectionCreated {
            election_id: id,
            admin: election.admin.clone(),
            title: election.title.clone(),
        };
        Ok((election, event))
    }

    pub fn id(&self) -> ElectionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn state(&self) -> ElectionState {
        self.state
    }

    pub fn voting_type(&self) -> VotingType {
        self.voting_type
    }

    pub fn max_votes_per_voter(&self) -> u32 {
        self.max_votes_per_voter
    }

    pub fn requires_registration(&self) -> bool {
        self.requires_registration
    }

    pub fn results_visible(&self) -> bool {
        self.results_visible
    }

    /// Is voting possible right now? Checked afresh on every ballot.
    pub fn is_accepting_votes(&self, now: DateTime<Utc>) -> bool {
        self.state == ElectionState::Active && self.start_time <= now && now <= self.end_time
    }

    /// Open the election for voting.
    pub fn start(
        &mut self,
        caller: &Identity,
        now: DateTime<Utc>,
    ) -> Result<ElectionEvent, ElectionError> {
        gate::ensure_admin(caller, self)?;
        if self.state != ElectionState::Created
            || self.candidates.len() < MIN_CANDIDATES
            || now < self.start_time
        {
            return Err(ElectionError::NotReady);
        }
        self.transition(ElectionState::Active)
    }

    /// Temporarily stop accepting ballots.
    pub fn pause(&mut self, caller: &Identity) -> Result<ElectionEvent, ElectionError> {
        gate::ensure_admin(caller, self)?;
        self.transition(ElectionState::Paused)
    }

    /// Resume a paused election, provided it has not run past its end time.
    pub fn resume(
        &mut self,
        caller: &Identity,
        now: DateTime<Utc>,
    ) -> Result<ElectionEvent, ElectionError> {
        gate::ensure_admin(caller, self)?;
        self.check_transition(ElectionState::Active)?;
        if now > self.end_time {
            return Err(ElectionError::ScheduleExpired);
        }
        self.transition(ElectionState::Active)
    }

    /// Finish the election, possibly before its scheduled end time.
    pub fn end(&mut self, caller: &Identity) -> Result<ElectionEvent, ElectionError> {
        gate::ensure_admin(caller, self)?;
        self.transition(ElectionState::Ended)
    }

    /// Abandon the election.
    pub fn cancel(&mut self, caller: &Identity) -> Result<ElectionEvent, ElectionError> {
        gate::ensure_admin(caller, self)?;
        self.transition(ElectionState::Canceled)
    }

    fn check_transition(&self, next: ElectionState) -> Result<(), ElectionError> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(ElectionError::InvalidTransition {
                from: self.state,
                to: next,
            })
        }
    }

    fn transition(&mut self, next: ElectionState) -> Result<ElectionEvent, ElectionError> {
        self.check_transition(next)?;
        self.state = next;
        Ok(ElectionEvent::StateChanged {
            election_id: self.id,
            state: next,
        })
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    use chrono::{Duration, TimeZone};

    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    pub fn admin() -> Identity {
        Identity::new("returning-officer")
    }

    impl Election {
        /// A fresh election built from `spec` at [`t0`], with `candidates` candidates.
        pub fn example_with(spec: ElectionSpec, candidates: usize) -> Self {
            let (mut election, _) = Election::create(1, admin(), spec, t0()).unwrap();
            for i in 1..=candidates {
                election
                    .add_candidate(&admin(), format!("Candidate {i}"), String::new())
                    .unwrap();
            }
            election
        }

        /// A single-choice election with two candidates, already started at `t0 + 100s`.
        pub fn active_example() -> Self {
            let mut election = Self::example_with(ElectionSpec::single_choice_example(t0()), 2);
            election
                .start(&admin(), t0() + Duration::seconds(100))
                .unwrap();
            election
        }
    }
}

#[cfg(test)]
pub(super) use examples::{admin, t0};
