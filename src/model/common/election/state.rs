use std::fmt::{Display, Formatter};

use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the Election lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionState {
    /// Under construction: candidates may still be added.
    Created,
    /// Accepting ballots within the scheduled window.
    Active,
    /// Temporarily not accepting ballots.
    Paused,
    /// Finished; tallies are disclosed.
    Ended,
    /// Abandoned by the admin.
    Canceled,
}

impl ElectionState {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Canceled)
    }

    /// Is `self -> next` an edge of the lifecycle graph?
    pub fn can_transition_to(self, next: ElectionState) -> bool {
        use ElectionState::*;
        matches!(
            (self, next),
            (Created, Active)
                | (Active, Paused)
                | (Paused, Active)
                | (Active | Paused, Ended)
                | (Created | Active | Paused, Canceled)
        )
    }
}

impl Display for ElectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Active => "Active",
            Self::Paused => "Paused",
            Self::Ended => "Ended",
            Self::Canceled => "Canceled",
        };
        write!(f, "{name}")
    }
}

impl From<ElectionState> for Bson {
    fn from(state: ElectionState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}
