use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{game::RoundDetail, phase::VisiblePhase, public::TeamScoreDto},
    state::game::TeamColor,
};

/// HSV color exchanged with clients.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TeamColorDto {
    /// Hue in degrees.
    pub hue: f32,
    /// Saturation in `[0, 1]`.
    pub saturation: f32,
    /// Value in `[0, 1]`.
    pub value: f32,
}

impl Validate for TeamColorDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !(0.0..=1.0).contains(&self.saturation) {
            errors.add("saturation", ValidationError::new("saturation_range"));
        }
        if !(0.0..=1.0).contains(&self.value) {
            errors.add("value", ValidationError::new("value_range"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<TeamColor> for TeamColorDto {
    fn from(color: TeamColor) -> Self {
        Self {
            hue: color.h,
            saturation: color.s,
            value: color.v,
        }
    }
}

impl From<TeamColorDto> for TeamColor {
    fn from(dto: TeamColorDto) -> Self {
        Self {
            h: dto.hue,
            s: dto.saturation,
            v: dto.value,
        }
    }
}

/// Shared snapshot describing the current gameplay phase and related context.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GamePhaseSnapshot {
    pub phase: VisiblePhase,
    pub game_id: Option<Uuid>,
    /// True when the backend operates in degraded mode (no connection to database).
    pub degraded: bool,
    /// Present whenever a round is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundDetail>,
    /// Present during the resolution and results phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoreboard: Option<Vec<TeamScoreDto>>,
}
