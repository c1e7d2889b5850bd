//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Datetimes are serialised as RFC 3339 strings.
//! - Vote figures are already masked according to the visibility policy.

pub mod ballot;
pub mod caller;
pub mod candidate;
pub mod election;
pub mod voter;
