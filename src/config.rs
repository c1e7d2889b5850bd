use std::sync::Arc;

use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::clock::SystemClock;
use crate::model::common::identity::Identity;
use crate::registry::Registry;
use crate::store::{ElectionStore, MemoryStore, MongoStore};

/// Name of the MongoDB database the registry lives in.
pub const DATABASE_NAME: &str = "election_manager";

/// Which [`ElectionStore`] backs the registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    #[default]
    Memory,
    Mongodb,
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    owner: Identity,
    #[serde(default = "default_caller_header")]
    caller_header: String,
    #[serde(default)]
    storage: Storage,
}

fn default_caller_header() -> String {
    "X-Caller-Identity".to_string()
}

impl Config {
    /// The registry owner, who may read any voter's choices and dump any
    /// disclosed election.
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// The request header the upstream authenticator puts the caller identity in.
    pub fn caller_header(&self) -> &str {
        &self.caller_header
    }

    /// Where elections are stored.
    pub fn storage(&self) -> Storage {
        self.storage
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!(
            "Registry owner is {}, caller identity read from `{}`",
            config.owner, config.caller_header
        );

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// A fairing that builds the configured election store and places a
/// [`Registry`] over it into managed state. Must be attached after
/// [`ConfigFairing`].
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Election store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config.clone(),
            None => {
                error!("Application config must be loaded before the election store");
                return Err(rocket);
            }
        };

        let store: Box<dyn ElectionStore> = match config.storage() {
            Storage::Memory => {
                warn!("Using in-memory election store, nothing will be persisted");
                Box::new(MemoryStore::new())
            }
            Storage::Mongodb => match connect_mongo(&rocket).await {
                Some(store) => Box::new(store),
                None => return Err(rocket),
            },
        };

        // Manage the state.
        let registry = Registry::new(store, Arc::new(SystemClock), config.owner().clone());
        rocket = rocket.manage(registry);
        Ok(rocket)
    }
}

/// Load the MongoDB config, connect, and perform any setup necessary.
async fn connect_mongo(rocket: &Rocket<Build>) -> Option<MongoStore> {
    // Load the config.
    let config = match rocket.figment().extract::<DbConfig>() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load database config");
            rocket::config::pretty_print_error(e);
            return None;
        }
    };
    info!("Loaded database config, connecting...");

    // Construct the connection.
    let client = match MongoClient::with_uri_str(config.db_uri).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {e}");
            return None;
        }
    };

    // Ensure the required indexes and the election ID counter exist.
    match MongoStore::connect(client, DATABASE_NAME).await {
        Ok(store) => {
            info!("...database connection online!");
            Some(store)
        }
        Err(e) => {
            error!("Failed to set up database: {e}");
            None
        }
    }
}
