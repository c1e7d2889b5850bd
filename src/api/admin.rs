use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{
        caller::Caller,
        candidate::{CandidateSpec, CandidateView},
        election::{ElectionDump, ElectionInfo},
        voter::VoterRegistration,
    },
    common::{election::ElectionId, identity::Identity},
    election::{ElectionSpec, VoterStatus},
};
use crate::registry::Registry;

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        add_candidate,
        register_voter,
        remove_voter,
        start_election,
        pause_election,
        resume_election,
        end_election,
        cancel_election,
        election_dump,
    ]
}

/// Create an election administered by the caller.
#[post("/elections", data = "<spec>", format = "json")]
pub async fn create_election(
    caller: Caller,
    spec: Json<ElectionSpec>,
    registry: &State<Registry>,
) -> Result<Json<ElectionInfo>> {
    let election = registry
        .create_election(caller.identity(), spec.into_inner())
        .await?;
    Ok(Json((&election).into()))
}

#[post("/elections/<election_id>/candidates", data = "<candidate>", format = "json")]
pub async fn add_candidate(
    caller: Caller,
    election_id: ElectionId,
    candidate: Json<CandidateSpec>,
    registry: &State<Registry>,
) -> Result<Json<CandidateView>> {
    let CandidateSpec { name, description } = candidate.into_inner();
    let (election, candidate_id) = registry
        .add_candidate(caller.identity(), election_id, name, description)
        .await?;
    let candidate = election.candidate(candidate_id)?;
    Ok(Json(CandidateView::new(candidate, &election)))
}

#[post("/elections/<election_id>/voters", data = "<registration>", format = "json")]
pub async fn register_voter(
    caller: Caller,
    election_id: ElectionId,
    registration: Json<VoterRegistration>,
    registry: &State<Registry>,
) -> Result<Json<VoterStatus>> {
    let VoterRegistration { voter, weight } = registration.into_inner();
    let election = registry
        .register_voter(caller.identity(), election_id, voter.clone(), weight)
        .await?;
    Ok(Json(election.voter_status(&voter)))
}

#[delete("/elections/<election_id>/voters/<voter>")]
pub async fn remove_voter(
    caller: Caller,
    election_id: ElectionId,
    voter: Identity,
    registry: &State<Registry>,
) -> Result<Json<VoterStatus>> {
    let election = registry
        .remove_voter(caller.identity(), election_id, &voter)
        .await?;
    Ok(Json(election.voter_status(&voter)))
}

#[post("/elections/<election_id>/start")]
pub async fn start_election(
    caller: Caller,
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<ElectionInfo>> {
    let election = registry
        .start_election(caller.identity(), election_id)
        .await?;
    Ok(Json((&election).into()))
}

#[post("/elections/<election_id>/pause")]
pub async fn pause_election(
    caller: Caller,
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<ElectionInfo>> {
    let election = registry
        .pause_election(caller.identity(), election_id)
        .await?;
    Ok(Json((&election).into()))
}

#[post("/elections/<election_id>/resume")]
pub async fn resume_election(
    caller: Caller,
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<ElectionInfo>> {
    let election = registry
        .resume_election(caller.identity(), election_id)
        .await?;
    Ok(Json((&election).into()))
}

#[post("/elections/<election_id>/end")]
pub async fn end_election(
    caller: Caller,
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<ElectionInfo>> {
    let election = registry
        .end_election(caller.identity(), election_id)
        .await?;
    Ok(Json((&election).into()))
}

#[post("/elections/<election_id>/cancel")]
pub async fn cancel_election(
    caller: Caller,
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<ElectionInfo>> {
    let election = registry
        .cancel_election(caller.identity(), election_id)
        .await?;
    Ok(Json((&election).into()))
}

/// Full record of a disclosed election, for offline auditing.
#[get("/elections/<election_id>/dump")]
pub async fn election_dump(
    caller: Caller,
    election_id: ElectionId,
    registry: &State<Registry>,
) -> Result<Json<ElectionDump>> {
    Ok(Json(registry.dump(caller.identity(), election_id).await?))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::clock::{Clock, ManualClock};
    use crate::model::{common::election::ElectionState, election::ErrorKind};

    use super::super::helpers::{self, caller, ADMIN, OWNER};
    use super::*;

    #[backend_test]
    async fn create_election(client: Client, clock: ManualClock) {
        let spec = ElectionSpec::single_choice_example(clock.now());
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .header(caller(ADMIN))
            .body(serde_json::to_string(&spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let election: ElectionInfo = helpers::body(response).await;
        assert_eq!(election.id, 1);
        assert_eq!(election.admin, Identity::new(ADMIN));
        assert_eq!(election.state, ElectionState::Created);
        assert_eq!(election.title, spec.title);
        assert_eq!(election.start_time, spec.start_time);
        assert_eq!(election.candidate_count, 0);

        // IDs are sequential.
        let second = helpers::create_election(&client, &spec, 0).await;
        assert_eq!(second.id, 2);
    }

    #[backend_test]
    async fn bad_create_election(client: Client, clock: ManualClock) {
        // Start time in the past.
        let mut spec = ElectionSpec::single_choice_example(clock.now());
        spec.start_time = clock.now() - Duration::seconds(1);
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .header(caller(ADMIN))
            .body(serde_json::to_string(&spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body: serde_json::Value = helpers::body(response).await;
        assert_eq!(body["kind"], serde_json::json!(ErrorKind::Validation));

        // No caller identity.
        let spec = ElectionSpec::single_choice_example(clock.now());
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Nothing was created.
        let response = client
            .get(uri!(crate::api::public::election_count))
            .dispatch()
            .await;
        assert_eq!(helpers::body::<u32>(response).await, 0);
    }

    #[backend_test]
    async fn candidates_only_before_start(client: Client, clock: ManualClock) {
        let spec = ElectionSpec::single_choice_example(clock.now());
        let election = helpers::create_election(&client, &spec, 1).await;

        // Only the admin may add candidates.
        let candidate = CandidateSpec {
            name: "Interloper".to_string(),
            description: String::new(),
        };
        let response = client
            .post(uri!(add_candidate(election.id)))
            .header(ContentType::JSON)
            .header(caller("voter"))
            .body(serde_json::to_string(&candidate).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        // Can't start with a single candidate.
        clock.advance(Duration::seconds(100));
        assert_eq!(
            helpers::transition(&client, election.id, "start", ADMIN).await,
            Status::Conflict
        );

        let candidate = CandidateSpec {
            name: "Second".to_string(),
            description: "Runner-up".to_string(),
        };
        let response = client
            .post(uri!(add_candidate(election.id)))
            .header(ContentType::JSON)
            .header(caller(ADMIN))
            .body(serde_json::to_string(&candidate).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let view: CandidateView = helpers::body(response).await;
        assert_eq!(view.id, 2);
        assert_eq!(view.description, "Runner-up");

        assert_eq!(
            helpers::transition(&client, election.id, "start", ADMIN).await,
            Status::Ok
        );

        // Frozen once started.
        let response = client
            .post(uri!(add_candidate(election.id)))
            .header(ContentType::JSON)
            .header(caller(ADMIN))
            .body(serde_json::to_string(&candidate).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
    }

    #[backend_test]
    async fn register_and_remove_voters(client: Client, clock: ManualClock) {
        let spec = ElectionSpec::single_choice_example(clock.now());
        let election = helpers::create_election(&client, &spec, 2).await;
        let voter = Identity::new("voter");

        // Register.
        let registration = VoterRegistration {
            voter: voter.clone(),
            weight: 3,
        };
        let response = client
            .post(uri!(register_voter(election.id)))
            .header(ContentType::JSON)
            .header(caller(ADMIN))
            .body(serde_json::to_string(&registration).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let status: VoterStatus = helpers::body(response).await;
        assert!(status.is_registered);
        assert_eq!(status.weight, 3);

        // Registering twice is rejected.
        let response = client
            .post(uri!(register_voter(election.id)))
            .header(ContentType::JSON)
            .header(caller(ADMIN))
            .body(serde_json::to_string(&registration).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        // Zero weight is rejected.
        let response = client
            .post(uri!(register_voter(election.id)))
            .header(ContentType::JSON)
            .header(caller(ADMIN))
            .body(r#"{"voter": "other", "weight": 0}"#)
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        // Remove.
        let response = client
            .delete(uri!(remove_voter(election.id, &voter)))
            .header(caller(ADMIN))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let status: VoterStatus = helpers::body(response).await;
        assert!(!status.is_registered);
        assert_eq!(status.weight, 3);

        // Removing again is rejected.
        let response = client
            .delete(uri!(remove_voter(election.id, &voter)))
            .header(caller(ADMIN))
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
    }

    #[backend_test]
    async fn lifecycle(client: Client, clock: ManualClock) {
        let spec = ElectionSpec::open_example(clock.now());
        let election = helpers::create_election(&client, &spec, 2).await;
        let id = election.id;

        // Too early, then only the admin may start it.
        assert_eq!(helpers::transition(&client, id, "start", ADMIN).await, Status::Conflict);
        clock.advance(Duration::seconds(100));
        assert_eq!(helpers::transition(&client, id, "start", OWNER).await, Status::Forbidden);

        // Active -> Paused -> Active.
        for (action, state) in [
            ("start", ElectionState::Active),
            ("pause", ElectionState::Paused),
            ("resume", ElectionState::Active),
            ("pause", ElectionState::Paused),
        ] {
            assert_eq!(helpers::transition(&client, id, action, ADMIN).await, Status::Ok);
            let response = client
                .get(uri!(crate::api::public::election_info(id)))
                .dispatch()
                .await;
            let info: ElectionInfo = helpers::body(response).await;
            assert_eq!(info.state, state);
        }

        // Can't resume once the end time has passed.
        clock.advance(Duration::seconds(1001));
        assert_eq!(helpers::transition(&client, id, "resume", ADMIN).await, Status::Conflict);

        // Ended is terminal.
        assert_eq!(helpers::transition(&client, id, "end", ADMIN).await, Status::Ok);
        for action in ["start", "pause", "resume", "end", "cancel"] {
            assert_eq!(
                helpers::transition(&client, id, action, ADMIN).await,
                Status::Conflict
            );
        }

        // Unknown elections.
        assert_eq!(helpers::transition(&client, 99, "cancel", ADMIN).await, Status::NotFound);
    }

    #[backend_test]
    async fn dump_after_disclosure(client: Client, clock: ManualClock) {
        let spec = ElectionSpec::single_choice_example(clock.now());
        let election = helpers::create_election(&client, &spec, 2).await;
        helpers::register(&client, election.id, "alice", 1).await;
        helpers::register(&client, election.id, "bob", 2).await;
        clock.advance(Duration::seconds(100));
        helpers::transition(&client, election.id, "start", ADMIN).await;
        assert_eq!(helpers::vote(&client, election.id, "alice", 2).await, Status::Ok);
        assert_eq!(helpers::vote(&client, election.id, "bob", 2).await, Status::Ok);

        // Hidden while running.
        let response = client
            .get(uri!(election_dump(election.id)))
            .header(caller(ADMIN))
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        helpers::transition(&client, election.id, "end", ADMIN).await;

        // Voters can't dump.
        let response = client
            .get(uri!(election_dump(election.id)))
            .header(caller("alice"))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        // The owner can, and it adds up.
        let response = client
            .get(uri!(election_dump(election.id)))
            .header(caller(OWNER))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let dump: ElectionDump = helpers::body(response).await;
        assert_eq!(dump.election.total_votes, 3);
        assert_eq!(dump.candidates[1].vote_count, 3);
        assert_eq!(dump.voters.len(), 2);
        assert_eq!(dump.audit(), Ok(()));
    }
}
