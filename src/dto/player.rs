//! Request/response payloads for the player-facing API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{game::ParticipantSummary, validation::validate_nickname};

/// Join (or re-join) the loaded game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGameRequest {
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

/// Result of a join call. `created` is false when the device had already
/// joined and the existing participant row was returned.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinGameResponse {
    pub participant: ParticipantSummary,
    pub created: bool,
}

/// Change the caller's own nickname.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChangeNicknameRequest {
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

/// Toggle one participant in or out of a team's lineup. Only the team leader
/// may call this.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LineupToggleRequest {
    pub team_id: Uuid,
    pub participant_id: Uuid,
}

/// Cast or change the caller's vote for the team predicted to lose.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CastVoteRequest {
    pub team_id: Uuid,
}

/// Acknowledgement of a recorded vote.
#[derive(Debug, Serialize, ToSchema)]
pub struct CastVoteResponse {
    pub round_id: Uuid,
    /// True when this replaced an earlier vote by the same participant.
    pub changed: bool,
}
