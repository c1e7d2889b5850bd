mod state;
mod voting_type;

pub use state::ElectionState;
pub use voting_type::VotingType;

/// Our election IDs are sequential integers, starting at 1.
pub type ElectionId = u32;
/// Candidate IDs are sequential integers local to their election, starting at 1.
pub type CandidateId = u32;
/// Multiplier applied to a voter's ballot.
pub type Weight = u32;
/// Accumulated weighted votes.
pub type VoteCount = u64;
