//! Request/response payloads for the host-facing API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::{
    common::TeamColorDto,
    game::GameStatusDto,
    validation::{validate_nickname, validate_title},
};

/// Payload used to bootstrap a brand-new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Maximum number of teams the host allows.
    #[validate(range(min = 2))]
    pub max_teams: u32,
    /// Maximum roster size per team; omit for unlimited.
    #[serde(default)]
    pub max_players_per_team: Option<u32>,
    #[validate(nested)]
    #[serde(default)]
    pub teams: Vec<TeamInput>,
    #[validate(nested)]
    #[serde(default)]
    pub challenges: Vec<ChallengeInput>,
}

/// Incoming team definition for the game bootstrap or a later creation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TeamInput {
    pub name: String,
    /// Optional HSV color. If omitted, the backend chooses the first unused
    /// color from the configured colors set.
    #[serde(default)]
    #[schema(value_type = Option<TeamColorDto>)]
    pub color: Option<TeamColorDto>,
}

impl Validate for TeamInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_title(&self.name) {
            errors.add("name", e);
        }
        if let Some(ref color) = self.color {
            if let Err(color_errors) = color.validate() {
                errors.merge_self("color", Err(color_errors));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Incoming challenge definition.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChallengeInput {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Required lineup size per team; omit for any nonzero count.
    #[serde(default)]
    pub participants_per_team: Option<u32>,
}

/// Partial update of game-level settings. Absent fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGameSettingsRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<GameStatusInput>,
    #[serde(default)]
    pub max_teams: Option<u32>,
    /// If omitted, the limit is unchanged. If null, the limit is removed.
    #[serde(default)]
    #[schema(value_type = Option<u32>)]
    pub max_players_per_team: Option<Option<u32>>,
}

/// Writable subset of [`GameStatusDto`].
#[derive(Debug, Deserialize, ToSchema, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusInput {
    Draft,
    Ready,
    Completed,
    Archived,
}

impl From<GameStatusInput> for GameStatusDto {
    fn from(value: GameStatusInput) -> Self {
        match value {
            GameStatusInput::Draft => GameStatusDto::Draft,
            GameStatusInput::Ready => GameStatusDto::Ready,
            GameStatusInput::Completed => GameStatusDto::Completed,
            GameStatusInput::Archived => GameStatusDto::Archived,
        }
    }
}

/// Partial update of a team. Absent fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTeamRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<TeamColorDto>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update of a challenge. Absent fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateChallengeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub participants_per_team: Option<Option<u32>>,
}

/// New order for the challenge rotation; must list every challenge exactly once.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderChallengesRequest {
    pub order: Vec<Uuid>,
}

/// Host-recorded outcome for one team of the active round.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OutcomeRequest {
    pub is_loser: bool,
    #[serde(default)]
    pub challenge_points: u32,
}

/// Move a participant to a team (`null` unassigns them).
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTeamRequest {
    pub team_id: Option<Uuid>,
}

/// Appoint a team leader (`null` clears the leader).
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetLeaderRequest {
    pub participant_id: Option<Uuid>,
}

/// Rename a participant on their behalf.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RenameParticipantRequest {
    #[validate(custom(function = "validate_nickname"))]
    pub nickname: String,
}

/// Join link returned to the host display.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinLinkResponse {
    /// Absent when no base URL is configured and the request origin is unknown.
    pub url: Option<String>,
}
