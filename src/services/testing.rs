//! Shared fixtures for service-level tests.

use std::sync::Arc;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        game_store::GameStore,
        models::{GameEntity, GameListItemEntity, RoundEntity},
        storage::StorageResult,
    },
    state::{AppState, SharedState, game::GameSession, state_machine::GamePhase},
};

/// Store that accepts every write and answers reads with nothing.
pub struct NullStore;

impl GameStore for NullStore {
    fn save_game(&self, _game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn find_game(&self, _id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        Box::pin(async { Ok(None) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn delete_game(&self, _id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        Box::pin(async { Ok(false) })
    }

    fn save_round(&self, _round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn list_rounds(&self, _game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn delete_rounds(&self, _game_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Build a non-degraded state with `game` loaded and the machine in `phase`.
pub async fn state_with_game(game: GameSession, phase: GamePhase) -> SharedState {
    let state = AppState::new(AppConfig::default());
    state.install_game_store(Arc::new(NullStore)).await;
    state
        .with_current_game_slot_mut(|slot| {
            slot.replace(game);
        })
        .await;
    state.restore_phase(phase).await;
    state
}
