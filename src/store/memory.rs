use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rocket::tokio::sync::Mutex;

use crate::error::Result;
use crate::model::{
    common::election::ElectionId,
    election::{Election, ElectionEvent, EventRecord},
};

use super::{number_events, ElectionStore};

/// A store that keeps everything in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: ElectionId,
    elections: BTreeMap<ElectionId, Election>,
    events: BTreeMap<ElectionId, Vec<EventRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn next_election_id(&self) -> Result<ElectionId> {
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        Ok(inner.last_id)
    }

    async fn load(&self, id: ElectionId) -> Result<Option<Election>> {
        Ok(self.inner.lock().await.elections.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Election>> {
        Ok(self.inner.lock().await.elections.values().cloned().collect())
    }

    async fn count(&self) -> Result<u32> {
        Ok(self.inner.lock().await.elections.len() as u32)
    }

    async fn commit(
        &self,
        election: &Election,
        events: Vec<ElectionEvent>,
        at: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>> {
        let mut inner = self.inner.lock().await;
        let log = inner.events.entry(election.id()).or_default();
        let records = number_events(log.len() as u64, events, at);
        log.extend(records.iter().cloned());
        inner.elections.insert(election.id(), election.clone());
        Ok(records)
    }

    async fn events(&self, id: ElectionId) -> Result<Vec<EventRecord>> {
        Ok(self
            .inner
            .lock()
            .await
            .events
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}
