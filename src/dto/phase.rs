use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Players are joining and teams are being arranged.
    Lobby,
    /// Team leaders are picking their lineups.
    LeaderSelection,
    /// Votes on the predicted loser are open.
    Voting,
    /// The physical challenge is being played.
    Action,
    /// Outcomes are revealed and scores graded.
    Resolution,
    /// Final standings.
    Results,
}

impl From<GamePhase> for VisiblePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Lobby => VisiblePhase::Lobby,
            GamePhase::LeaderSelection => VisiblePhase::LeaderSelection,
            GamePhase::Voting => VisiblePhase::Voting,
            GamePhase::Action => VisiblePhase::Action,
            GamePhase::Resolution => VisiblePhase::Resolution,
            GamePhase::Results => VisiblePhase::Results,
        }
    }
}
