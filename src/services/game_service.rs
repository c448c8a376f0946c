//! Persistence helpers shared by the host and player services.

use crate::{
    dao::models::RoundEntity,
    error::ServiceError,
    state::{SharedState, state_machine::GamePhase},
};

/// Persist the loaded game document, tagging it with `phase`. During a
/// transition the target phase is passed in because the machine only flips
/// after the work succeeds.
pub async fn persist_game_as(state: &SharedState, phase: GamePhase) -> Result<(), ServiceError> {
    let entity = state.read_loaded_game(|game| game.to_entity(phase)).await?;
    let store = state.require_game_store().await?;
    store.save_game(entity).await?;
    Ok(())
}

/// Persist the loaded game with the phase the machine currently reports.
pub async fn persist_game(state: &SharedState) -> Result<(), ServiceError> {
    let phase = state.state_machine_phase().await;
    persist_game_as(state, phase).await
}

/// Persist the active round document of the loaded game.
pub async fn persist_active_round(state: &SharedState) -> Result<(), ServiceError> {
    let entity = state
        .read_loaded_game(|game| {
            game.active_round
                .as_ref()
                .map(|round| RoundEntity::from((game.id, round)))
        })
        .await?
        .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;
    let store = state.require_game_store().await?;
    store.save_round(entity).await?;
    Ok(())
}
