use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    api::candidate::CandidateView,
    common::{
        election::{CandidateId, VoteCount, Weight},
        identity::Identity,
    },
    election::Election,
};

use super::ElectionInfo;

/// One voter's full record, as included in a dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub voter: Identity,
    pub is_registered: bool,
    pub has_voted: bool,
    pub weight: Weight,
    pub choices: Vec<CandidateId>,
}

/// Everything needed to independently re-check an election's tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDump {
    pub election: ElectionInfo,
    pub candidates: Vec<CandidateView>,
    pub voters: Vec<VoterRecord>,
}

/// Ways a dump can fail to add up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("expected candidate ID {expected}, found {found}")]
    CandidateIds {
        expected: CandidateId,
        found: CandidateId,
    },
    #[error("election claims {claimed} candidates but lists {actual}")]
    CandidateCount { claimed: u32, actual: usize },
    #[error("voter {voter} chose unknown candidate {candidate_id}")]
    UnknownChoice {
        voter: Identity,
        candidate_id: CandidateId,
    },
    #[error("voter {voter} chose candidate {candidate_id} more than once")]
    DuplicateChoice {
        voter: Identity,
        candidate_id: CandidateId,
    },
    #[error("voter {voter} made {chosen} choices, more than the limit of {limit}")]
    TooManyChoices {
        voter: Identity,
        chosen: usize,
        limit: u32,
    },
    #[error("voter {voter} has voted={has_voted} but {chosen} recorded choices")]
    VotedFlag {
        voter: Identity,
        has_voted: bool,
        chosen: usize,
    },
    #[error("candidate {candidate_id} claims {claimed} votes, ballots add up to {recomputed}")]
    Tally {
        candidate_id: CandidateId,
        claimed: VoteCount,
        recomputed: VoteCount,
    },
    #[error("recomputed tallies overflow")]
    Overflow,
    #[error("election claims {claimed} votes in total, candidates add up to {recomputed}")]
    Total {
        claimed: VoteCount,
        recomputed: VoteCount,
    },
}

impl From<&Election> for ElectionDump {
    fn from(election: &Election) -> Self {
        Self {
            election: election.into(),
            candidates: election
                .candidates()
                .iter()
                .map(|c| CandidateView::new(c, election))
                .collect(),
            voters: election
                .voters()
                .map(|(identity, voter)| VoterRecord {
                    voter: identity.clone(),
                    is_registered: voter.is_registered(),
                    has_voted: voter.has_voted(),
                    weight: voter.weight(),
                    choices: voter.choices().to_vec(),
                })
                .collect(),
        }
    }
}

impl ElectionDump {
    /// Recompute every tally from the voters' ballots and compare against the claimed figures.
    pub fn audit(&self) -> Result<(), AuditError> {
        // Candidate IDs must be dense from 1.
        for (position, candidate) in self.candidates.iter().enumerate() {
            let expected = position as CandidateId + 1;
            if candidate.id != expected {
                return Err(AuditError::CandidateIds {
                    expected,
                    found: candidate.id,
                });
            }
        }
        if self.election.candidate_count as usize != self.candidates.len() {
            return Err(AuditError::CandidateCount {
                claimed: self.election.candidate_count,
                actual: self.candidates.len(),
            });
        }

        // Replay every ballot.
        let mut recomputed: BTreeMap<CandidateId, VoteCount> =
            self.candidates.iter().map(|c| (c.id, 0)).collect();
        for record in &self.voters {
            if record.has_voted == record.choices.is_empty() {
                return Err(AuditError::VotedFlag {
                    voter: record.voter.clone(),
                    has_voted: record.has_voted,
                    chosen: record.choices.len(),
                });
            }
            if record.choices.len() > self.election.max_votes_per_voter as usize {
                return Err(AuditError::TooManyChoices {
                    voter: record.voter.clone(),
                    chosen: record.choices.len(),
                    limit: self.election.max_votes_per_voter,
                });
            }
            let weight = VoteCount::from(record.weight.max(1));
            let mut seen = HashSet::new();
            for &candidate_id in &record.choices {
                if !seen.insert(candidate_id) {
                    return Err(AuditError::DuplicateChoice {
                        voter: record.voter.clone(),
                        candidate_id,
                    });
                }
                let tally =
                    recomputed
                        .get_mut(&candidate_id)
                        .ok_or_else(|| AuditError::UnknownChoice {
                            voter: record.voter.clone(),
                            candidate_id,
                        })?;
                *tally = checked_tally(*tally, weight)?;
            }
        }

        for candidate in &self.candidates {
            let tally = recomputed[&candidate.id];
            if candidate.vote_count != tally {
                return Err(AuditError::Tally {
                    candidate_id: candidate.id,
                    claimed: candidate.vote_count,
                    recomputed: tally,
                });
            }
        }
        let sum = recomputed
            .values()
            .try_fold(0, |sum, &tally| checked_tally(sum, tally))?;
        if self.election.total_votes != sum {
            return Err(AuditError::Total {
                claimed: self.election.total_votes,
                recomputed: sum,
            });
        }

        Ok(())
    }
}

fn checked_tally(tally: VoteCount, added: VoteCount) -> Result<VoteCount, AuditError> {
    tally.checked_add(added).ok_or(AuditError::Overflow)
}
