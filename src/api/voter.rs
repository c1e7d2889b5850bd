use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        ballot::{MultipleBallot, SingleBallot},
        caller::Caller,
    },
    common::{
        election::{CandidateId, ElectionId},
        identity::Identity,
    },
    election::VoterStatus,
};
use crate::registry::Registry;

pub fn routes() -> Vec<Route> {
    routes![cast_vote, cast_multiple_votes, voter_choices]
}

/// Cast the caller's ballot for a single candidate.
#[post("/elections/<election_id>/vote", data = "<ballot>", format = "json")]
pub async fn cast_vote(
    caller: Caller,
    election_id: ElectionId,
    ballot: Json<SingleBallot>,
    registry: &State<Registry>,
) -> Result<Json<VoterStatus>> {
    let election = registry
        .cast_vote(caller.identity(), election_id, ballot.candidate_id)
        .await?;
    Ok(Json(election.voter_status(caller.identity())))
}

/// Cast the caller's ballot for several candidates.
#[post("/elections/<election_id>/votes", data = "<ballot>", format = "json")]
pub async fn cast_multiple_votes(
    caller: Caller,
    election_id: ElectionId,
    ballot: Json<MultipleBallot>,
    registry: &State<Registry>,
) -> Result<Json<VoterStatus>> {
    let election = registry
        .cast_multiple_votes(caller.identity(), election_id, &ballot.candidate_ids)
        .await?;
    Ok(Json(election.voter_status(caller.identity())))
}

#[get("/elections/<election_id>/voters/<voter>/choices")]
pub async fn voter_choices(
    caller: Caller,
    election_id: ElectionId,
    voter: Identity,
    registry: &State<Registry>,
) -> Result<Json<Vec<CandidateId>>> {
    let choices = registry
        .voter_choices(caller.identity(), election_id, &voter)
        .await?;
    Ok(Json(choices))
}
