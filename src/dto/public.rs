//! Read-only payloads served to any client.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    aggregate::{TeamTally, VoteTally},
    game::GameSession,
    scoring::TeamScore,
};

/// Vote counts for one target team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamTallyDto {
    pub team_id: Uuid,
    pub count: u32,
    /// Integer percentage of the total (0 when nobody voted yet).
    pub percentage: u32,
}

impl From<TeamTally> for TeamTallyDto {
    fn from(value: TeamTally) -> Self {
        Self {
            team_id: value.team_id,
            count: value.count,
            percentage: value.percentage,
        }
    }
}

/// Aggregated tally for the active round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VoteTallyDto {
    pub round_id: Uuid,
    pub total: u32,
    pub entries: Vec<TeamTallyDto>,
}

impl From<VoteTally> for VoteTallyDto {
    fn from(value: VoteTally) -> Self {
        Self {
            round_id: value.round_id,
            total: value.total,
            entries: value.entries.into_iter().map(Into::into).collect(),
        }
    }
}

/// One team's standings on the scoreboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamScoreDto {
    pub team_id: Uuid,
    pub name: String,
    pub vote_points: u32,
    pub challenge_points: u32,
    pub total: u32,
}

impl TeamScoreDto {
    pub fn from_score(session: &GameSession, score: TeamScore) -> Self {
        let name = session
            .teams
            .get(&score.team_id)
            .map(|team| team.name.clone())
            .unwrap_or_default();
        Self {
            team_id: score.team_id,
            name,
            vote_points: score.vote_points,
            challenge_points: score.challenge_points,
            total: score.total,
        }
    }
}

/// Scoreboard returned by the leaderboard route and terminal phase events.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardDto {
    pub scores: Vec<TeamScoreDto>,
}
