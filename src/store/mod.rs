//! The persistence collaborator: where elections and their notification logs live.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    common::election::ElectionId,
    election::{Election, ElectionEvent, EventRecord},
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Storage for election records keyed by election ID.
///
/// Stores do no validation of their own; the registry only ever commits
/// elections produced by a successful operation.
#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    /// Allocate the next election ID. IDs start at 1 and are never reused,
    /// even if the election they were allocated for is never committed.
    async fn next_election_id(&self) -> Result<ElectionId>;

    /// Fetch one election.
    async fn load(&self, id: ElectionId) -> Result<Option<Election>>;

    /// Fetch every election, in ascending ID order.
    async fn list(&self) -> Result<Vec<Election>>;

    /// How many elections have been committed.
    async fn count(&self) -> Result<u32>;

    /// Persist `election` and append `events` to its log as one unit.
    ///
    /// Returns the records as stored, with their sequence numbers.
    async fn commit(
        &self,
        election: &Election,
        events: Vec<ElectionEvent>,
        at: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>>;

    /// The notification log of one election, in emission order.
    async fn events(&self, id: ElectionId) -> Result<Vec<EventRecord>>;
}

/// Number the `events` following on from a log already `existing` records long.
fn number_events(
    existing: u64,
    events: Vec<ElectionEvent>,
    at: DateTime<Utc>,
) -> Vec<EventRecord> {
    events
        .into_iter()
        .zip(existing + 1..)
        .map(|(event, sequence)| EventRecord::new(sequence, at, event))
        .collect()
}
