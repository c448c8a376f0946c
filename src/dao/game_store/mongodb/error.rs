use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB-specific operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures raised by the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable {var}")]
    MissingEnvVar { var: &'static str },
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        #[source]
        source: mongodb::error::Error,
    },
    #[error("initial ping failed after {attempts} attempts")]
    InitialPing {
        attempts: u32,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("health ping failed")]
    HealthPing {
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to save game {id}")]
    SaveGame {
        id: Uuid,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to load game {id}")]
    LoadGame {
        id: Uuid,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to delete game {id}")]
    DeleteGame {
        id: Uuid,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to save round {id} of game {game_id}")]
    SaveRound {
        game_id: Uuid,
        id: Uuid,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to list rounds of game {game_id}")]
    ListRounds {
        game_id: Uuid,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to delete rounds of game {game_id}")]
    DeleteRounds {
        game_id: Uuid,
        #[source]
        source: mongodb::error::Error,
    },
}
