//! Identity Gate: who may do what to an election.

use crate::model::common::identity::Identity;

use super::{Election, ElectionError};

/// Is `caller` the admin of `election`?
pub fn is_admin(caller: &Identity, election: &Election) -> bool {
    caller == election.admin()
}

/// Is `caller` the registry owner?
pub fn is_owner(caller: &Identity, owner: &Identity) -> bool {
    caller == owner
}

/// Reject anyone but the admin of `election`.
pub fn ensure_admin(caller: &Identity, election: &Election) -> Result<(), ElectionError> {
    if is_admin(caller, election) {
        Ok(())
    } else {
        Err(ElectionError::Unauthorized)
    }
}

/// Reject anyone but the admin of `election` or the registry owner.
pub fn ensure_admin_or_owner(
    caller: &Identity,
    election: &Election,
    owner: &Identity,
) -> Result<(), ElectionError> {
    if is_admin(caller, election) || is_owner(caller, owner) {
        Ok(())
    } else {
        Err(ElectionError::Unauthorized)
    }
}
