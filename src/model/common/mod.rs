//! Types shared between the storage model and the API model.

pub mod election;
pub mod identity;
