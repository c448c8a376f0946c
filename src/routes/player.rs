use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{post, put},
};

use crate::{
    dto::{
        game::ParticipantSummary,
        player::{
            CastVoteRequest, CastVoteResponse, ChangeNicknameRequest, JoinGameRequest,
            JoinGameResponse, LineupToggleRequest,
        },
    },
    error::AppError,
    services::player_service,
    state::SharedState,
};

const PLAYER_ID_HEADER: &str = "x-player-id";

/// Player-facing endpoints. Every request carries a stable `X-Player-Id`
/// header identifying the device.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/play/join", post(join))
        .route("/play/nickname", put(change_nickname))
        .route("/play/lineup/toggle", post(toggle_lineup))
        .route("/play/vote", post(cast_vote))
}

fn player_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(PLAYER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| AppError::Unauthorized("missing player id header `X-Player-Id`".into()))
}

#[utoipa::path(
    post,
    path = "/play/join",
    tag = "player",
    params(("X-Player-Id" = String, Header, description = "Stable identifier of the player device")),
    request_body = JoinGameRequest,
    responses((status = 200, description = "Joined (or already joined) the loaded game", body = JoinGameResponse))
)]
/// Join the loaded game. Joining again with the same player id returns the
/// existing participant.
pub async fn join(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, AppError> {
    let user_id = player_id(&headers)?;
    Ok(Json(player_service::join(&state, &user_id, payload).await?))
}

#[utoipa::path(
    put,
    path = "/play/nickname",
    tag = "player",
    params(("X-Player-Id" = String, Header, description = "Stable identifier of the player device")),
    request_body = ChangeNicknameRequest,
    responses((status = 200, description = "Nickname changed", body = ParticipantSummary))
)]
/// Change the caller's own nickname.
pub async fn change_nickname(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<ChangeNicknameRequest>,
) -> Result<Json<ParticipantSummary>, AppError> {
    let user_id = player_id(&headers)?;
    Ok(Json(
        player_service::change_nickname(&state, &user_id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/play/lineup/toggle",
    tag = "player",
    params(("X-Player-Id" = String, Header, description = "Stable identifier of the player device")),
    request_body = LineupToggleRequest,
    responses((status = 204, description = "Lineup membership toggled"))
)]
/// Toggle a teammate in or out of the caller's team lineup (leaders only).
pub async fn toggle_lineup(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<LineupToggleRequest>,
) -> Result<StatusCode, AppError> {
    let user_id = player_id(&headers)?;
    player_service::toggle_lineup(&state, &user_id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/play/vote",
    tag = "player",
    params(("X-Player-Id" = String, Header, description = "Stable identifier of the player device")),
    request_body = CastVoteRequest,
    responses((status = 200, description = "Vote recorded", body = CastVoteResponse))
)]
/// Cast or change the caller's vote for the predicted losing team.
pub async fn cast_vote(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<CastVoteRequest>,
) -> Result<Json<CastVoteResponse>, AppError> {
    let user_id = player_id(&headers)?;
    Ok(Json(
        player_service::cast_vote(&state, &user_id, payload).await?,
    ))
}
