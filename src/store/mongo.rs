use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use mongodb::{
    bson::doc,
    options::{FindOptions, ReplaceOptions},
    Client, Database,
};
use rocket::{futures::TryStreamExt, http::Status};

use crate::error::{Error, Result};
use crate::model::{
    common::election::ElectionId,
    election::{Election, ElectionEvent, EventRecord},
    mongodb::{
        ensure_election_id_counter_exists, ensure_indexes_exist, is_duplicate_key_error, Coll,
        Counter, ELECTION_ID_COUNTER_ID,
    },
};

use super::{number_events, ElectionStore};

/// A store backed by MongoDB. Commits run in a transaction, so the server
/// must be a replica set.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    elections: Coll<Election>,
    events: Coll<EventRecord>,
    counters: Coll<Counter>,
}

impl MongoStore {
    /// Wrap the given database, creating indexes and the election ID counter if needed.
    pub async fn connect(client: Client, db_name: &str) -> Result<Self> {
        let db = client.database(db_name);
        ensure_indexes_exist(&db).await?;
        let store = Self::from_db(client, &db);
        ensure_election_id_counter_exists(&store.counters).await?;
        Ok(store)
    }

    fn from_db(client: Client, db: &Database) -> Self {
        Self {
            client,
            elections: Coll::from_db(db),
            events: Coll::from_db(db),
            counters: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl ElectionStore for MongoStore {
    async fn next_election_id(&self) -> Result<ElectionId> {
        let next = Counter::next(&self.counters, ELECTION_ID_COUNTER_ID).await?;
        ElectionId::try_from(next).map_err(|_| {
            Error::Status(
                Status::InternalServerError,
                format!("Election ID {next} is out of range"),
            )
        })
    }

    async fn load(&self, id: ElectionId) -> Result<Option<Election>> {
        Ok(self.elections.find_one(doc! { "_id": id }, None).await?)
    }

    async fn list(&self) -> Result<Vec<Election>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let elections = self
            .elections
            .find(None, options)
            .await?
            .try_collect()
            .await?;
        Ok(elections)
    }

    async fn count(&self) -> Result<u32> {
        let count = self.elections.count_documents(None, None).await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn commit(
        &self,
        election: &Election,
        events: Vec<ElectionEvent>,
        at: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        // Replace the whole record, inserting it if this is its first commit.
        let filter = doc! { "_id": election.id() };
        let upsert = ReplaceOptions::builder().upsert(true).build();
        self.elections
            .replace_one_with_session(filter, election, upsert, &mut session)
            .await?;

        // Append the events after whatever is already logged.
        let log_filter = doc! { "election_id": election.id() };
        let existing = self
            .events
            .count_documents_with_session(log_filter, None, &mut session)
            .await?;
        let records = number_events(existing, events, at);
        if !records.is_empty() {
            let result = self
                .events
                .insert_many_with_session(&records, None, &mut session)
                .await;
            if is_duplicate_key_error(result.as_ref()) {
                return Err(Error::Status(
                    Status::Conflict,
                    format!(
                        "Election {} was modified concurrently, try again",
                        election.id()
                    ),
                ));
            }
            result?;
        }

        session.commit_transaction().await?;
        Ok(records)
    }

    async fn events(&self, id: ElectionId) -> Result<Vec<EventRecord>> {
        let options = FindOptions::builder().sort(doc! { "sequence": 1 }).build();
        let events = self
            .events
            .find(doc! { "election_id": id }, options)
            .await?
            .try_collect()
            .await?;
        Ok(events)
    }
}
