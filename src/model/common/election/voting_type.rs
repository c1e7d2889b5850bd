use serde::{Deserialize, Serialize};

/// How many candidates a single ballot may select.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VotingType {
    /// Exactly one candidate per voter.
    SingleChoice,
    /// Up to `max_votes_per_voter` distinct candidates per voter.
    MultipleChoice,
}
