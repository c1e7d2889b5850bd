//! The election registry: the single entry point for every election operation.
//!
//! Mutations are totally ordered. Each one loads the election, applies the
//! operation to that working copy, and commits the result together with its
//! notifications only if the operation succeeded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::Result;
use crate::model::{
    api::{
        candidate::CandidateView,
        election::{ElectionDump, ElectionInfo, ElectionSummary},
    },
    common::{
        election::{CandidateId, ElectionId, Weight},
        identity::Identity,
    },
    election::{gate, Election, ElectionError, ElectionEvent, ElectionSpec, EventRecord, VoterStatus},
};
use crate::store::{ElectionStore, MemoryStore};

pub struct Registry {
    store: Box<dyn ElectionStore>,
    clock: Arc<dyn Clock>,
    owner: Identity,
    sequencer: Mutex<()>,
}

impl Registry {
    pub fn new(store: Box<dyn ElectionStore>, clock: Arc<dyn Clock>, owner: Identity) -> Self {
        Self {
            store,
            clock,
            owner,
            sequencer: Mutex::new(()),
        }
    }

    /// A registry over a fresh [`MemoryStore`].
    pub fn in_memory(clock: Arc<dyn Clock>, owner: Identity) -> Self {
        Self::new(Box::new(MemoryStore::new()), clock, owner)
    }

    /// The registry owner.
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Create an election administered by `caller`.
    pub async fn create_election(&self, caller: &Identity, spec: ElectionSpec) -> Result<Election> {
        let _sequenced = self.sequencer.lock().await;
        let now = self.clock.now();

        // Validate before allocating so that rejected calls don't use up IDs.
        if let Err(err) = spec.validate(now) {
            return Err(self.rejected("create_election", None, err));
        }
        let id = self.store.next_election_id().await?;
        let (election, event) = Election::create(id, caller.clone(), spec, now)
            .map_err(|err| self.rejected("create_election", Some(id), err))?;
        self.commit(&election, vec![event], now).await?;
        Ok(election)
    }

    pub async fn add_candidate(
        &self,
        caller: &Identity,
        id: ElectionId,
        name: String,
        description: String,
    ) -> Result<(Election, CandidateId)> {
        self.apply(id, "add_candidate", |election, _| {
            let (candidate_id, event) = election.add_candidate(caller, name, description)?;
            Ok((candidate_id, vec![event]))
        })
        .await
    }

    pub async fn register_voter(
        &self,
        caller: &Identity,
        id: ElectionId,
        voter: Identity,
        weight: Weight,
    ) -> Result<Election> {
        self.apply(id, "register_voter", |election, _| {
            let event = election.register_voter(caller, voter, weight)?;
            Ok(((), vec![event]))
        })
        .await
        .map(|(election, _)| election)
    }

    pub async fn remove_voter(
        &self,
        caller: &Identity,
        id: ElectionId,
        voter: &Identity,
    ) -> Result<Election> {
        self.apply(id, "remove_voter", |election, _| {
            let event = election.remove_voter(caller, voter)?;
            Ok(((), vec![event]))
        })
        .await
        .map(|(election, _)| election)
    }

    pub async fn start_election(&self, caller: &Identity, id: ElectionId) -> Result<Election> {
        self.transition(id, "start_election", |election, now| {
            election.start(caller, now)
        })
        .await
    }

    pub async fn pause_election(&self, caller: &Identity, id: ElectionId) -> Result<Election> {
        self.transition(id, "pause_election", |election, _| election.pause(caller))
            .await
    }

    pub async fn resume_election(&self, caller: &Identity, id: ElectionId) -> Result<Election> {
        self.transition(id, "resume_election", |election, now| {
            election.resume(caller, now)
        })
        .await
    }

    pub async fn end_election(&self, caller: &Identity, id: ElectionId) -> Result<Election> {
        self.transition(id, "end_election", |election, _| election.end(caller))
            .await
    }

    pub async fn cancel_election(&self, caller: &Identity, id: ElectionId) -> Result<Election> {
        self.transition(id, "cancel_election", |election, _| election.cancel(caller))
            .await
    }

    /// Cast `caller`'s ballot for one candidate.
    pub async fn cast_vote(
        &self,
        caller: &Identity,
        id: ElectionId,
        candidate_id: CandidateId,
    ) -> Result<Election> {
        self.apply(id, "cast_vote", |election, now| {
            let events = election.cast_vote(caller, candidate_id, now)?;
            Ok(((), events))
        })
        .await
        .map(|(election, _)| election)
    }

    /// Cast `caller`'s ballot for several candidates at once.
    pub async fn cast_multiple_votes(
        &self,
        caller: &Identity,
        id: ElectionId,
        candidate_ids: &[CandidateId],
    ) -> Result<Election> {
        self.apply(id, "cast_multiple_votes", |election, now| {
            let events = election.cast_multiple_votes(caller, candidate_ids, now)?;
            Ok(((), events))
        })
        .await
        .map(|(election, _)| election)
    }

    /// Fetch an election, as stored.
    pub async fn election(&self, id: ElectionId) -> Result<Election> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| ElectionError::ElectionNotFound(id).into())
    }

    pub async fn election_info(&self, id: ElectionId) -> Result<ElectionInfo> {
        Ok(ElectionInfo::from(&self.election(id).await?))
    }

    /// One candidate, with its tally masked until results are disclosed.
    pub async fn candidate(&self, id: ElectionId, candidate_id: CandidateId) -> Result<CandidateView> {
        let election = self.election(id).await?;
        let candidate = election.candidate(candidate_id)?;
        Ok(CandidateView::new(candidate, &election))
    }

    pub async fn candidates(&self, id: ElectionId) -> Result<Vec<CandidateView>> {
        let election = self.election(id).await?;
        Ok(election
            .candidates()
            .iter()
            .map(|c| CandidateView::new(c, &election))
            .collect())
    }

    pub async fn voter_status(&self, id: ElectionId, voter: &Identity) -> Result<VoterStatus> {
        Ok(self.election(id).await?.voter_status(voter))
    }

    /// A voter's choices, in the order they were cast.
    pub async fn voter_choices(
        &self,
        caller: &Identity,
        id: ElectionId,
        voter: &Identity,
    ) -> Result<Vec<CandidateId>> {
        let election = self.election(id).await?;
        let choices = election.voter_choices(caller, &self.owner, voter)?;
        Ok(choices.to_vec())
    }

    /// Number of elections created so far.
    pub async fn election_count(&self) -> Result<u32> {
        self.store.count().await
    }

    pub async fn elections(&self) -> Result<Vec<ElectionSummary>> {
        let elections = self.store.list().await?;
        Ok(elections.iter().map(ElectionSummary::from).collect())
    }

    /// The notification log of one election, as `caller` may see it.
    ///
    /// Ballot records are shown only to those allowed to read the voter's
    /// choices, so the log never reveals more than the masked tallies do.
    pub async fn events(&self, caller: &Identity, id: ElectionId) -> Result<Vec<EventRecord>> {
        let election = self.election(id).await?;
        let records = self.store.events(id).await?;
        Ok(records
            .into_iter()
            .filter(|record| election.can_view_event(caller, &self.owner, &record.event))
            .collect())
    }

    /// Everything needed to audit an election. Only available to its admin
    /// and the registry owner, and only once results are disclosed.
    pub async fn dump(&self, caller: &Identity, id: ElectionId) -> Result<ElectionDump> {
        let election = self.election(id).await?;
        gate::ensure_admin_or_owner(caller, &election, &self.owner)?;
        if !election.results_disclosed() {
            return Err(ElectionError::ResultsHidden.into());
        }
        Ok(ElectionDump::from(&election))
    }

    /// Run a state transition and return the updated election.
    async fn transition<F>(&self, id: ElectionId, operation: &str, f: F) -> Result<Election>
    where
        F: FnOnce(&mut Election, DateTime<Utc>) -> Result<ElectionEvent, ElectionError> + Send,
    {
        self.apply(id, operation, |election, now| {
            let event = f(election, now)?;
            Ok(((), vec![event]))
        })
        .await
        .map(|(election, _)| election)
    }

    /// Load the election, apply `f` to a working copy, and commit the copy
    /// and its notifications if `f` succeeded. Holds the sequencer throughout.
    async fn apply<T, F>(&self, id: ElectionId, operation: &str, f: F) -> Result<(Election, T)>
    where
        T: Send,
        F: FnOnce(&mut Election, DateTime<Utc>) -> Result<(T, Vec<ElectionEvent>), ElectionError>
            + Send,
    {
        let _sequenced = self.sequencer.lock().await;
        let now = self.clock.now();

        let mut election = match self.store.load(id).await? {
            Some(election) => election,
            None => return Err(self.rejected(operation, Some(id), ElectionError::ElectionNotFound(id))),
        };
        let (value, events) = f(&mut election, now)
            .map_err(|err| self.rejected(operation, Some(id), err))?;
        self.commit(&election, events, now).await?;
        Ok((election, value))
    }

    async fn commit(
        &self,
        election: &Election,
        events: Vec<ElectionEvent>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let records = self.store.commit(election, events, now).await?;
        for record in records {
            info!("#{} {}", record.sequence, record.event);
        }
        Ok(())
    }

    fn rejected(
        &self,
        operation: &str,
        id: Option<ElectionId>,
        err: ElectionError,
    ) -> crate::error::Error {
        match id {
            Some(id) => debug!("{operation} on election {id} rejected ({:?}): {err}", err.kind()),
            None => debug!("{operation} rejected ({:?}): {err}", err.kind()),
        }
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use crate::clock::ManualClock;
    use crate::error::Error;
    use crate::model::common::election::ElectionState;

    fn owner() -> Identity {
        Identity::new("registry-owner")
    }

    fn admin() -> Identity {
        Identity::new("returning-officer")
    }

    fn registry() -> (Registry, ManualClock) {
        let clock = ManualClock::example();
        let registry = Registry::in_memory(Arc::new(clock.clone()), owner());
        (registry, clock)
    }

    fn election_error<T: std::fmt::Debug>(result: Result<T>) -> ElectionError {
        match result {
            Err(Error::Election(err)) => err,
            other => panic!("expected an election error, got {other:?}"),
        }
    }

    /// Create an election from `spec` and give it `n` candidates.
    async fn setup(registry: &Registry, spec: ElectionSpec, n: usize) -> ElectionId {
        let id = registry.create_election(&admin(), spec).await.unwrap().id();
        for i in 1..=n {
            registry
                .add_candidate(&admin(), id, format!("Candidate {i}"), String::new())
                .await
                .unwrap();
        }
        id
    }

    #[rocket::async_test]
    async fn weighted_single_choice_scenario() {
        let (registry, clock) = registry();
        let id = setup(&registry, ElectionSpec::single_choice_example(clock.now()), 2).await;
        let (a, b) = (Identity::new("voter-a"), Identity::new("voter-b"));
        registry.register_voter(&admin(), id, a.clone(), 1).await.unwrap();
        registry.register_voter(&admin(), id, b.clone(), 2).await.unwrap();

        clock.advance(Duration::seconds(100));
        registry.start_election(&admin(), id).await.unwrap();
        registry.cast_vote(&a, id, 1).await.unwrap();
        registry.cast_vote(&b, id, 2).await.unwrap();

        // Hidden while running.
        assert_eq!(registry.election_info(id).await.unwrap().total_votes, 0);
        assert_eq!(registry.candidate(id, 2).await.unwrap().vote_count, 0);

        clock.advance(Duration::seconds(1001));
        let election = registry.end_election(&admin(), id).await.unwrap();
        assert_eq!(election.state(), ElectionState::Ended);
        assert_eq!(registry.candidate(id, 1).await.unwrap().vote_count, 1);
        assert_eq!(registry.candidate(id, 2).await.unwrap().vote_count, 2);
        assert_eq!(registry.election_info(id).await.unwrap().total_votes, 3);
    }

    #[rocket::async_test]
    async fn multiple_choice_scenario() {
        let (registry, clock) = registry();
        let id = setup(&registry, ElectionSpec::multiple_choice_example(clock.now()), 3).await;
        let voter = Identity::new("voter");
        registry.register_voter(&admin(), id, voter.clone(), 1).await.unwrap();
        clock.advance(Duration::seconds(100));
        registry.start_election(&admin(), id).await.unwrap();

        registry.cast_multiple_votes(&voter, id, &[1, 3]).await.unwrap();

        let counts: Vec<_> = registry
            .candidates(id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.vote_count)
            .collect();
        assert_eq!(counts, vec![1, 0, 1]);
        assert_eq!(
            registry.voter_choices(&voter, id, &voter).await.unwrap(),
            vec![1, 3]
        );
    }

    #[rocket::async_test]
    async fn pause_blocks_voting_until_resumed() {
        let (registry, clock) = registry();
        let id = setup(&registry, ElectionSpec::open_example(clock.now()), 2).await;
        clock.advance(Duration::seconds(100));
        registry.start_election(&admin(), id).await.unwrap();

        let paused = registry.pause_election(&admin(), id).await.unwrap();
        assert_eq!(paused.state(), ElectionState::Paused);
        let voter = Identity::new("voter");
        assert_eq!(
            election_error(registry.cast_vote(&voter, id, 1).await),
            ElectionError::ElectionNotActive
        );

        let resumed = registry.resume_election(&admin(), id).await.unwrap();
        assert_eq!(resumed.state(), ElectionState::Active);
        registry.cast_vote(&voter, id, 1).await.unwrap();
        assert!(registry.voter_status(id, &voter).await.unwrap().has_voted);
    }

    #[rocket::async_test]
    async fn ids_are_sequential_and_rejections_use_none() {
        let (registry, clock) = registry();
        let now = clock.now();

        let mut bad = ElectionSpec::open_example(now);
        bad.start_time = now;
        assert_eq!(
            election_error(registry.create_election(&admin(), bad).await),
            ElectionError::InvalidSchedule
        );
        assert_eq!(registry.election_count().await.unwrap(), 0);

        let first = setup(&registry, ElectionSpec::open_example(now), 0).await;
        let second = setup(&registry, ElectionSpec::open_example(now), 0).await;
        assert_eq!((first, second), (1, 2));
        assert_eq!(registry.election_count().await.unwrap(), 2);
        let ids: Vec<_> = registry
            .elections()
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[rocket::async_test]
    async fn rejected_calls_change_nothing() {
        let (registry, clock) = registry();
        let id = setup(&registry, ElectionSpec::multiple_choice_example(clock.now()), 3).await;
        let voter = Identity::new("voter");
        registry.register_voter(&admin(), id, voter.clone(), 2).await.unwrap();
        clock.advance(Duration::seconds(100));
        registry.start_election(&admin(), id).await.unwrap();

        let before = registry.election(id).await.unwrap();
        let logged = registry.events(&admin(), id).await.unwrap().len();

        assert_eq!(
            election_error(registry.cast_multiple_votes(&voter, id, &[2, 2]).await),
            ElectionError::DuplicateChoice(2)
        );
        assert_eq!(
            election_error(registry.add_candidate(&admin(), id, "Late".to_string(), String::new()).await),
            ElectionError::ElectionAlreadyStarted
        );
        assert_eq!(
            election_error(registry.pause_election(&voter, id).await),
            ElectionError::Unauthorized
        );
        assert_eq!(
            election_error(registry.start_election(&admin(), id).await),
            ElectionError::NotReady
        );

        assert_eq!(registry.election(id).await.unwrap(), before);
        assert_eq!(registry.events(&admin(), id).await.unwrap().len(), logged);
    }

    #[rocket::async_test]
    async fn events_are_logged_in_order() {
        let (registry, clock) = registry();
        let id = setup(&registry, ElectionSpec::multiple_choice_example(clock.now()), 2).await;
        let voter = Identity::new("voter");
        registry.register_voter(&admin(), id, voter.clone(), 3).await.unwrap();
        clock.advance(Duration::seconds(100));
        registry.start_election(&admin(), id).await.unwrap();
        registry.cast_multiple_votes(&voter, id, &[2, 1]).await.unwrap();

        let log = registry.events(&admin(), id).await.unwrap();
        let sequences: Vec<_> = log.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, (1..=7).collect::<Vec<u64>>());
        assert!(matches!(log[0].event, ElectionEvent::ElectionCreated { .. }));
        assert_eq!(
            log[5].event,
            ElectionEvent::VoteCast {
                election_id: id,
                voter: voter.clone(),
                candidate_id: 2,
                weight: 3,
            }
        );
        assert!(matches!(
            log[6].event,
            ElectionEvent::VoteCast { candidate_id: 1, .. }
        ));
    }

    #[rocket::async_test]
    async fn ballots_in_the_log_are_private() {
        let (registry, clock) = registry();
        let id = setup(&registry, ElectionSpec::single_choice_example(clock.now()), 2).await;
        let voter = Identity::new("secret-voter");
        let nosy = Identity::new("nosy");
        registry.register_voter(&admin(), id, voter.clone(), 7).await.unwrap();
        clock.advance(Duration::seconds(100));
        registry.start_election(&admin(), id).await.unwrap();
        registry.cast_vote(&voter, id, 2).await.unwrap();

        let ballots = |log: Vec<EventRecord>| -> Vec<ElectionEvent> {
            log.into_iter()
                .map(|r| r.event)
                .filter(|e| matches!(e, ElectionEvent::VoteCast { .. }))
                .collect()
        };
        let cast = vec![ElectionEvent::VoteCast {
            election_id: id,
            voter: voter.clone(),
            candidate_id: 2,
            weight: 7,
        }];

        // Hidden from outsiders while the tallies are masked.
        assert_eq!(registry.candidate(id, 2).await.unwrap().vote_count, 0);
        let log = registry.events(&nosy, id).await.unwrap();
        assert_eq!(log.len(), 5);
        assert!(ballots(log).is_empty());

        for reader in [&voter, &admin(), &owner()] {
            assert_eq!(ballots(registry.events(reader, id).await.unwrap()), cast);
        }

        // Disclosed tallies still don't reveal who chose what.
        registry.end_election(&admin(), id).await.unwrap();
        assert_eq!(registry.candidate(id, 2).await.unwrap().vote_count, 7);
        let log = registry.events(&nosy, id).await.unwrap();
        assert_eq!(log.len(), 6);
        assert!(ballots(log).is_empty());
    }

    #[rocket::async_test]
    async fn missing_elections() {
        let (registry, _) = registry();
        assert_eq!(
            election_error(registry.election_info(7).await),
            ElectionError::ElectionNotFound(7)
        );
        assert_eq!(
            election_error(registry.events(&admin(), 7).await),
            ElectionError::ElectionNotFound(7)
        );
        assert_eq!(
            election_error(registry.start_election(&admin(), 7).await),
            ElectionError::ElectionNotFound(7)
        );
    }

    #[rocket::async_test]
    async fn choices_and_dumps_are_restricted() {
        let (registry, clock) = registry();
        let id = setup(&registry, ElectionSpec::single_choice_example(clock.now()), 2).await;
        let voter = Identity::new("voter");
        let nosy = Identity::new("nosy");
        registry.register_voter(&admin(), id, voter.clone(), 1).await.unwrap();
        clock.advance(Duration::seconds(100));
        registry.start_election(&admin(), id).await.unwrap();
        registry.cast_vote(&voter, id, 2).await.unwrap();

        for reader in [&voter, &admin(), &owner()] {
            assert_eq!(registry.voter_choices(reader, id, &voter).await.unwrap(), vec![2]);
        }
        assert_eq!(
            election_error(registry.voter_choices(&nosy, id, &voter).await),
            ElectionError::Unauthorized
        );

        // No dumps until the results are out.
        assert_eq!(
            election_error(registry.dump(&admin(), id).await),
            ElectionError::ResultsHidden
        );
        registry.end_election(&admin(), id).await.unwrap();
        assert_eq!(
            election_error(registry.dump(&nosy, id).await),
            ElectionError::Unauthorized
        );
        let dump = registry.dump(&owner(), id).await.unwrap();
        assert_eq!(dump.election.total_votes, 1);
        assert_eq!(dump.audit(), Ok(()));
    }
}
