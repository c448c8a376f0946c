use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        game::{ChallengeSummary, GameListItem, GameSummary, RoundDetail, TeamSummary},
        host::{
            AssignTeamRequest, ChallengeInput, CreateGameRequest, JoinLinkResponse,
            OutcomeRequest, RenameParticipantRequest, ReorderChallengesRequest, SetLeaderRequest,
            TeamInput, UpdateChallengeRequest, UpdateGameSettingsRequest, UpdateTeamRequest,
        },
        public::ScoreboardDto,
    },
    error::AppError,
    services::{host_service, sse_service},
    state::SharedState,
};

const HOST_TOKEN_HEADER: &str = "x-host-token";

/// Host-only endpoints for configuring and driving games. All routes require
/// the token negotiated over the host SSE stream.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/host/games", get(list_games).post(create_game))
        .route("/host/games/{id}", delete(delete_game))
        .route("/host/games/{id}/load", post(load_game))
        .route("/host/game", get(current_game))
        .route("/host/game/settings", put(update_settings))
        .route("/host/game/scoreboard", get(scoreboard))
        .route("/host/game/join-link", get(join_link))
        .route("/host/teams", post(create_team))
        .route("/host/teams/{id}", put(update_team).delete(delete_team))
        .route("/host/teams/{id}/leader", put(set_team_leader))
        .route("/host/participants/{id}/team", put(assign_participant))
        .route("/host/participants/{id}/nickname", put(rename_participant))
        .route("/host/challenges", post(create_challenge))
        .route(
            "/host/challenges/{id}",
            put(update_challenge).delete(delete_challenge),
        )
        .route("/host/challenges/order", put(reorder_challenges))
        .route("/host/game/start", post(start_round))
        .route("/host/game/voting/open", post(open_voting))
        .route("/host/game/voting/lock", post(lock_voting))
        .route("/host/game/outcomes/{team_id}", put(record_outcome).delete(clear_outcome))
        .route("/host/game/reveal", post(reveal_outcome))
        .route("/host/game/next", post(next_round))
        .route("/host/game/end", post(end_game))
        .route("/host/game/reset", post(reset_lobby))
        .route_layer(middleware::from_fn_with_state(state, require_host_token))
}

/// Retrieve all persisted games.
#[utoipa::path(
    get,
    path = "/host/games",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "List available games", body = [GameListItem]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    Ok(Json(host_service::list_games(&state).await?))
}

/// Create a new game and make it the loaded game.
#[utoipa::path(
    post,
    path = "/host/games",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = CreateGameRequest,
    responses((status = 200, description = "Game created", body = GameSummary))
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(host_service::create_game(&state, payload).await?))
}

/// Load a persisted game and make it current.
#[utoipa::path(
    post,
    path = "/host/games/{id}/load",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the game to load")),
    responses((status = 200, description = "Game loaded", body = GameSummary))
)]
pub async fn load_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(host_service::load_game(&state, id).await?))
}

/// Delete a persisted game together with its rounds.
#[utoipa::path(
    delete,
    path = "/host/games/{id}",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the game to delete")),
    responses((status = 204, description = "Game deleted"))
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    host_service::delete_game(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Full snapshot of the loaded game.
#[utoipa::path(
    get,
    path = "/host/game",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Loaded game", body = GameSummary))
)]
pub async fn current_game(
    State(state): State<SharedState>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(host_service::current_game_summary(&state).await?))
}

/// Apply a partial settings update to the loaded game.
#[utoipa::path(
    put,
    path = "/host/game/settings",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = UpdateGameSettingsRequest,
    responses((status = 200, description = "Settings updated", body = GameSummary))
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateGameSettingsRequest>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(host_service::update_settings(&state, payload).await?))
}

/// Current scoreboard of the loaded game.
#[utoipa::path(
    get,
    path = "/host/game/scoreboard",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Current scoreboard", body = ScoreboardDto))
)]
pub async fn scoreboard(State(state): State<SharedState>) -> Result<Json<ScoreboardDto>, AppError> {
    Ok(Json(host_service::current_scoreboard(&state).await?))
}

/// Join link players can open to reach the loaded game.
#[utoipa::path(
    get,
    path = "/host/game/join-link",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Join link", body = JoinLinkResponse))
)]
pub async fn join_link(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<JoinLinkResponse>, AppError> {
    let origin = headers
        .get(axum::http::header::ORIGIN)
        .and_then(|value| value.to_str().ok());
    Ok(Json(host_service::join_link(&state, origin).await?))
}

/// Add a team to the loaded game.
#[utoipa::path(
    post,
    path = "/host/teams",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = TeamInput,
    responses((status = 200, description = "Team created", body = TeamSummary))
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Json(payload): Json<TeamInput>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(host_service::create_team(&state, payload).await?))
}

/// Apply a partial update to a team.
#[utoipa::path(
    put,
    path = "/host/teams/{id}",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the team to update")),
    request_body = UpdateTeamRequest,
    responses((status = 200, description = "Team updated", body = TeamSummary))
)]
pub async fn update_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(host_service::update_team(&state, id, payload).await?))
}

/// Remove a team from the loaded game.
#[utoipa::path(
    delete,
    path = "/host/teams/{id}",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the team to delete")),
    responses((status = 204, description = "Team deleted"))
)]
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    host_service::delete_team(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Appoint or clear a team leader.
#[utoipa::path(
    put,
    path = "/host/teams/{id}/leader",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the team")),
    request_body = SetLeaderRequest,
    responses((status = 200, description = "Leader updated", body = TeamSummary))
)]
pub async fn set_team_leader(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetLeaderRequest>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(
        host_service::set_team_leader(&state, id, payload).await?,
    ))
}

/// Move a participant to a team, or unassign them.
#[utoipa::path(
    put,
    path = "/host/participants/{id}/team",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the participant")),
    request_body = AssignTeamRequest,
    responses((status = 204, description = "Participant reassigned"))
)]
pub async fn assign_participant(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignTeamRequest>,
) -> Result<StatusCode, AppError> {
    host_service::assign_participant(&state, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rename a participant on the host's behalf.
#[utoipa::path(
    put,
    path = "/host/participants/{id}/nickname",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the participant")),
    request_body = RenameParticipantRequest,
    responses((status = 204, description = "Participant renamed"))
)]
pub async fn rename_participant(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameParticipantRequest>,
) -> Result<StatusCode, AppError> {
    host_service::rename_participant(&state, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append a challenge to the rotation.
#[utoipa::path(
    post,
    path = "/host/challenges",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = ChallengeInput,
    responses((status = 200, description = "Challenge created", body = ChallengeSummary))
)]
pub async fn create_challenge(
    State(state): State<SharedState>,
    Json(payload): Json<ChallengeInput>,
) -> Result<Json<ChallengeSummary>, AppError> {
    Ok(Json(host_service::create_challenge(&state, payload).await?))
}

/// Apply a partial update to a challenge.
#[utoipa::path(
    put,
    path = "/host/challenges/{id}",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the challenge")),
    request_body = UpdateChallengeRequest,
    responses((status = 200, description = "Challenge updated", body = ChallengeSummary))
)]
pub async fn update_challenge(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateChallengeRequest>,
) -> Result<Json<ChallengeSummary>, AppError> {
    Ok(Json(
        host_service::update_challenge(&state, id, payload).await?,
    ))
}

/// Remove a challenge from the rotation.
#[utoipa::path(
    delete,
    path = "/host/challenges/{id}",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("id" = Uuid, Path, description = "Identifier of the challenge")),
    responses((status = 204, description = "Challenge deleted"))
)]
pub async fn delete_challenge(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    host_service::delete_challenge(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the challenge rotation order.
#[utoipa::path(
    put,
    path = "/host/challenges/order",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = ReorderChallengesRequest,
    responses((status = 204, description = "Rotation reordered"))
)]
pub async fn reorder_challenges(
    State(state): State<SharedState>,
    Json(payload): Json<ReorderChallengesRequest>,
) -> Result<StatusCode, AppError> {
    host_service::reorder_challenges(&state, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Leave the lobby and open a round in leader selection.
#[utoipa::path(
    post,
    path = "/host/game/start",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Round started", body = RoundDetail))
)]
pub async fn start_round(State(state): State<SharedState>) -> Result<Json<RoundDetail>, AppError> {
    Ok(Json(host_service::start_round(&state).await?))
}

/// Freeze lineups and open the vote.
#[utoipa::path(
    post,
    path = "/host/game/voting/open",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Voting opened", body = RoundDetail))
)]
pub async fn open_voting(State(state): State<SharedState>) -> Result<Json<RoundDetail>, AppError> {
    Ok(Json(host_service::open_voting(&state).await?))
}

/// Close the vote and move to the action phase.
#[utoipa::path(
    post,
    path = "/host/game/voting/lock",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Voting locked", body = RoundDetail))
)]
pub async fn lock_voting(State(state): State<SharedState>) -> Result<Json<RoundDetail>, AppError> {
    Ok(Json(host_service::lock_voting(&state).await?))
}

/// Record the outcome for one team of the active round.
#[utoipa::path(
    put,
    path = "/host/game/outcomes/{team_id}",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("team_id" = Uuid, Path, description = "Team the outcome belongs to")),
    request_body = OutcomeRequest,
    responses((status = 204, description = "Outcome recorded"))
)]
pub async fn record_outcome(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<OutcomeRequest>,
) -> Result<StatusCode, AppError> {
    host_service::record_outcome(&state, team_id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a recorded outcome.
#[utoipa::path(
    delete,
    path = "/host/game/outcomes/{team_id}",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("team_id" = Uuid, Path, description = "Team whose outcome is cleared")),
    responses((status = 204, description = "Outcome cleared"))
)]
pub async fn clear_outcome(
    State(state): State<SharedState>,
    Path(team_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    host_service::clear_outcome(&state, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reveal the round result and move to resolution.
#[utoipa::path(
    post,
    path = "/host/game/reveal",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Outcome revealed", body = RoundDetail))
)]
pub async fn reveal_outcome(
    State(state): State<SharedState>,
) -> Result<Json<RoundDetail>, AppError> {
    Ok(Json(host_service::reveal_outcome(&state).await?))
}

/// Archive the finished round and open the next one.
#[utoipa::path(
    post,
    path = "/host/game/next",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Next round opened", body = RoundDetail))
)]
pub async fn next_round(State(state): State<SharedState>) -> Result<Json<RoundDetail>, AppError> {
    Ok(Json(host_service::next_round(&state).await?))
}

/// Finish the game and show the final standings.
#[utoipa::path(
    post,
    path = "/host/game/end",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Game ended", body = ScoreboardDto))
)]
pub async fn end_game(State(state): State<SharedState>) -> Result<Json<ScoreboardDto>, AppError> {
    Ok(Json(host_service::end_game(&state).await?))
}

/// Reset the loaded game back to the lobby, wiping rounds and participants.
#[utoipa::path(
    post,
    path = "/host/game/reset",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Lobby reset", body = GameSummary))
)]
pub async fn reset_lobby(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(host_service::reset_lobby(&state).await?))
}

async fn require_host_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(HOST_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| AppError::Unauthorized("missing host token header `X-Host-Token`".into()))?;

    if sse_service::verify_host_token(&state, &provided).await {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized(
            "invalid host token; connect to /sse/host first".into(),
        ))
    }
}
