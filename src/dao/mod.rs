//! Persistence layer: storage-agnostic entities, the [`game_store::GameStore`]
//! contract, and the backends implementing it.

pub mod game_store;
pub mod models;
pub mod storage;
