use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        caller::Caller,
        candidate::CandidateView,
        election::{ElectionInfo, ElectionSummary},
    },
    common::{
        election::{CandidateId, ElectionId},
        identity::Identity,
    },
    election::{EventRecord, VoterStatus},
};
use crate::registry::Registry;

pub fn routes() -> Vec<Route> {
    routes![
        election_count,
        elections,
        election_info,
        candidates,
        candidate,
        voter_status,
        election_events,
    ]
}

/// Number of elections created so far.
#[get("/elections/count")]
pub async fn election_count(registry: &State<Registry>) -> Result<Json<u32>> {
    Ok(Json(registry.election_count().await?))
}

#[get("/elections")]
pub async fn elections(registry: &State<Registry>) -> Result<Json<Vec<ElectionSummary>>> {
    Ok(Json(registry.elections().await?))
}

#[get("/elections/<election_id>")]
pub async fn election_info(
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<ElectionInfo>> {
    Ok(Json(registry.election_info(election_id).await?))
}

#[get("/elections/<election_id>/candidates")]
pub async fn candidates(
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<Vec<CandidateView>>> {
    Ok(Json(registry.candidates(election_id).await?))
}

#[get("/elections/<election_id>/candidates/<candidate_id>")]
pub async fn candidate(
    election_id: ElectionId,
    candidate_id: CandidateId,
    registry: &State<Registry>,
) -> Result<Json<CandidateView>> {
    Ok(Json(registry.candidate(election_id, candidate_id).await?))
}

#[get("/elections/<election_id>/voters/<voter>")]
pub async fn voter_status(
    election_id: ElectionId,
    voter: Identity,
    registry: &State<Registry>,
) -> Result<Json<VoterStatus>> {
    Ok(Json(registry.voter_status(election_id, &voter).await?))
}

/// The notification log of one election. Ballots are only listed for
/// callers who may read the voter's choices.
#[get("/elections/<election_id>/events")]
pub async fn election_events(
    caller: Caller,
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<Vec<EventRecord>>> {
    Ok(Json(registry.events(caller.identity(), election_id).await?))
}
