use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        common::GamePhaseSnapshot,
        public::{ScoreboardDto, VoteTallyDto},
        sse::GameSnapshotEvent,
    },
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Read-only endpoints usable without authentication.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/public/game", get(game_snapshot))
        .route("/public/phase", get(current_phase))
        .route("/public/tally", get(current_tally))
        .route("/public/leaderboard", get(leaderboard))
}

#[utoipa::path(
    get,
    path = "/public/game",
    tag = "public",
    responses((status = 200, description = "Full snapshot of the loaded game", body = GameSnapshotEvent))
)]
/// Full state fetch, identical in shape to the `game.snapshot` SSE event.
pub async fn game_snapshot(State(state): State<SharedState>) -> Json<GameSnapshotEvent> {
    Json(public_service::snapshot(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/phase",
    tag = "public",
    responses((status = 200, description = "Current gameplay phase", body = GamePhaseSnapshot))
)]
/// Current phase with the active round and, once revealed, the scoreboard.
pub async fn current_phase(State(state): State<SharedState>) -> Json<GamePhaseSnapshot> {
    Json(public_service::phase(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/tally",
    tag = "public",
    responses((status = 200, description = "Vote tally of the active round", body = VoteTallyDto))
)]
/// Vote tally of the active round.
pub async fn current_tally(
    State(state): State<SharedState>,
) -> Result<Json<VoteTallyDto>, AppError> {
    Ok(Json(public_service::current_tally(&state).await?))
}

#[utoipa::path(
    get,
    path = "/public/leaderboard",
    tag = "public",
    responses((status = 200, description = "Cumulative team scores", body = ScoreboardDto))
)]
/// Cumulative scoreboard across every round.
pub async fn leaderboard(State(state): State<SharedState>) -> Result<Json<ScoreboardDto>, AppError> {
    Ok(Json(public_service::leaderboard(&state).await?))
}
