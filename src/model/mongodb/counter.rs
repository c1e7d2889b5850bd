use mongodb::{
    bson::doc,
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

use super::errors::is_duplicate_key_error;

/// ID of the counter that hands out election IDs.
pub const ELECTION_ID_COUNTER_ID: &str = "election_id";

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u64,
}

impl Counter {
    /// Create a new `Counter` with the given ID, starting at the given value.
    pub fn new(id: impl Into<String>, start: u64) -> Self {
        Self {
            id: id.into(),
            next: start,
        }
    }

    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u64> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter with ID {}", id),
                )
            })?;
        Ok(counter.next)
    }
}

/// Create the election ID counter, starting from 1, unless it already exists.
///
/// This operation is idempotent.
pub async fn ensure_election_id_counter_exists(counters: &Coll<Counter>) -> Result<(), DbError> {
    let existing = counters
        .find_one(doc! { "_id": ELECTION_ID_COUNTER_ID }, None)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    debug!("Creating election ID counter");
    let result = counters
        .insert_one(Counter::new(ELECTION_ID_COUNTER_ID, 1), None)
        .await;
    // Another instance may have won the race.
    if is_duplicate_key_error(result.as_ref()) {
        return Ok(());
    }
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    use mongodb::Database;

    #[backend_test(mongodb)]
    async fn counter_increment(db: Database) {
        const START: u64 = 5;

        // Create a counter and insert it.
        let counters = Coll::<Counter>::from_db(&db);
        counters
            .insert_one(Counter::new("test", START), None)
            .await
            .unwrap();

        // Get the next value.
        let next = Counter::next(&counters, "test").await.unwrap();
        assert_eq!(next, START);

        // Check the counter was incremented.
        let counter = counters
            .find_one(doc! { "_id": "test" }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.next, START + 1);
    }

    #[backend_test(mongodb)]
    async fn election_id_counter_is_created_once(db: Database) {
        let counters = Coll::<Counter>::from_db(&db);
        ensure_election_id_counter_exists(&counters).await.unwrap();
        assert_eq!(
            Counter::next(&counters, ELECTION_ID_COUNTER_ID).await.unwrap(),
            1
        );

        // A second call must not reset it.
        ensure_election_id_counter_exists(&counters).await.unwrap();
        assert_eq!(
            Counter::next(&counters, ELECTION_ID_COUNTER_ID).await.unwrap(),
            2
        );
    }
}
