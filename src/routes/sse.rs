use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::{
        sse_events,
        sse_service::{self, StreamKind},
    },
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/player",
    responses((status = 200, description = "Player SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime game events to player devices, starting with a handshake
/// and a full snapshot.
pub async fn player_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_player(&state);
    info!("New player SSE connection");

    let mut initial = Vec::new();
    let degraded = state.is_degraded().await;
    if let Some(handshake) = sse_service::handshake_event("player", degraded, None) {
        initial.push(handshake);
    }
    if let Some(snapshot) = sse_events::snapshot_server_event(&state).await {
        initial.push(snapshot);
    }

    sse_service::to_sse_stream(receiver, initial, StreamKind::Player)
}

#[utoipa::path(
    get,
    path = "/sse/host",
    responses((status = 200, description = "Host SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream host-only events, establishing the single host token. The token in
/// the handshake authorises every subsequent host REST call.
pub async fn host_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, token) = sse_service::subscribe_host(&state).await?;
    info!("New host SSE connection");

    let mut initial = Vec::new();
    let degraded = state.is_degraded().await;
    if let Some(handshake) = sse_service::handshake_event("host", degraded, Some(token)) {
        initial.push(handshake);
    }
    if let Some(snapshot) = sse_events::snapshot_server_event(&state).await {
        initial.push(snapshot);
    }

    Ok(sse_service::to_sse_stream(
        receiver,
        initial,
        StreamKind::Host(state),
    ))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/player", get(player_stream))
        .route("/sse/host", get(host_stream))
}
