//! The election core: state machine, candidate ledger, voter roll, ballot
//! processing and visibility policy.
//!
//! Everything here is synchronous and storage-agnostic. Operations take the
//! processing time as an argument and return the notifications they emit.

mod ballot;
mod candidate;
mod election_core;
mod error;
mod events;
pub mod gate;
mod spec;
mod visibility;
mod voter;

pub use candidate::Candidate;
pub use election_core::{Election, MIN_CANDIDATES};
pub use error::{ElectionError, ErrorKind};
pub use events::{ElectionEvent, EventRecord};
pub use spec::ElectionSpec;
pub use voter::{Voter, VoterStatus};
