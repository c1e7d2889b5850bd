#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{Config, ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::registry::Registry;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod registry;
pub mod store;

/// Build the server from `Rocket.toml` and the environment, with the
/// configured store and the system clock.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .attach(LoggerFairing)
}

/// Build the server around an existing registry, bypassing configuration loading.
pub fn rocket_for_registry(config: Config, registry: Registry) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .manage(config)
        .manage(registry)
        .attach(LoggerFairing)
}
