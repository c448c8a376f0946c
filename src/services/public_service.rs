//! Read-only queries served without authentication, mirroring what the SSE
//! feed pushes so late joiners and page reloads can catch up.

use crate::{
    dto::{
        common::GamePhaseSnapshot,
        public::{ScoreboardDto, VoteTallyDto},
        sse::GameSnapshotEvent,
    },
    error::ServiceError,
    services::sse_events,
    state::{SharedState, aggregate::tally_votes},
};

/// Full snapshot of the loaded game, identical to the `game.snapshot` event.
pub async fn snapshot(state: &SharedState) -> GameSnapshotEvent {
    sse_events::build_snapshot_event(state).await
}

/// Current phase with its round and, once scores are revealed, the scoreboard.
pub async fn phase(state: &SharedState) -> GamePhaseSnapshot {
    let current = state.state_machine_phase().await;
    sse_events::build_phase_snapshot(state, current).await
}

/// Vote tally of the active round.
pub async fn current_tally(state: &SharedState) -> Result<VoteTallyDto, ServiceError> {
    state
        .read_loaded_game(|game| {
            game.active_round
                .as_ref()
                .map(|round| VoteTallyDto::from(tally_votes(game, round)))
                .ok_or_else(|| ServiceError::InvalidState("no active round".into()))
        })
        .await?
}

/// Cumulative scoreboard across every finished and active round.
pub async fn leaderboard(state: &SharedState) -> Result<ScoreboardDto, ServiceError> {
    state.read_loaded_game(sse_events::scoreboard).await
}
