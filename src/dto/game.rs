use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{GameListItemEntity, GameStatusEntity},
    dto::{common::TeamColorDto, format_system_time},
    state::game::{GameSession, GameStatus, Round, RoundState},
};

/// Lifecycle status exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusDto {
    Draft,
    Ready,
    Live,
    Completed,
    Archived,
}

impl From<GameStatus> for GameStatusDto {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::Draft => GameStatusDto::Draft,
            GameStatus::Ready => GameStatusDto::Ready,
            GameStatus::Live => GameStatusDto::Live,
            GameStatus::Completed => GameStatusDto::Completed,
            GameStatus::Archived => GameStatusDto::Archived,
        }
    }
}

impl From<GameStatusEntity> for GameStatusDto {
    fn from(value: GameStatusEntity) -> Self {
        GameStatus::from(value).into()
    }
}

/// Round sub-state exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundStateDto {
    LeaderSelection,
    Voting,
    Action,
    Resolution,
}

impl From<RoundState> for RoundStateDto {
    fn from(value: RoundState) -> Self {
        match value {
            RoundState::LeaderSelection => RoundStateDto::LeaderSelection,
            RoundState::Voting => RoundStateDto::Voting,
            RoundState::Action => RoundStateDto::Action,
            RoundState::Resolution => RoundStateDto::Resolution,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a team exposed to REST/SSE clients.
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
    pub color: TeamColorDto,
    pub position: u32,
    pub is_active: bool,
    pub leader_participant_id: Option<Uuid>,
    /// Number of participants currently assigned to the team.
    pub member_count: u32,
}

impl TeamSummary {
    pub fn from_session(session: &GameSession, team_id: Uuid) -> Option<Self> {
        let team = session.teams.get(&team_id)?;
        Some(Self {
            id: team_id,
            name: team.name.clone(),
            color: team.color.clone().into(),
            position: team.position,
            is_active: team.is_active,
            leader_participant_id: team.leader_participant_id,
            member_count: session.roster_count(team_id) as u32,
        })
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a participant. The stable user id stays private.
pub struct ParticipantSummary {
    pub id: Uuid,
    pub nickname: String,
    pub team_id: Option<Uuid>,
}

impl ParticipantSummary {
    pub fn from_session(session: &GameSession, participant_id: Uuid) -> Option<Self> {
        let participant = session.participants.get(&participant_id)?;
        Some(Self {
            id: participant_id,
            nickname: participant.nickname.clone(),
            team_id: participant.team_id,
        })
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a challenge template.
pub struct ChallengeSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub participants_per_team: Option<u32>,
    pub position: u32,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// One lineup membership inside a round.
pub struct LineupEntryDto {
    pub team_id: Uuid,
    pub participant_id: Uuid,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Full projection of a round. Individual votes stay private; only the
/// aggregate count is exposed here.
pub struct RoundDetail {
    pub id: Uuid,
    pub sequence: u32,
    pub state: RoundStateDto,
    pub challenge_id: Option<Uuid>,
    pub leader_notes: String,
    pub losing_team_id: Option<Uuid>,
    pub lineup: Vec<LineupEntryDto>,
    pub vote_count: u32,
}

impl From<&Round> for RoundDetail {
    fn from(round: &Round) -> Self {
        Self {
            id: round.id,
            sequence: round.sequence,
            state: round.state.into(),
            challenge_id: round.challenge_id,
            leader_notes: round.leader_notes.clone(),
            losing_team_id: round.losing_team_id,
            lineup: round
                .lineup
                .iter()
                .map(|entry| LineupEntryDto {
                    team_id: entry.team_id,
                    participant_id: entry.participant_id,
                })
                .collect(),
            vote_count: round.votes.len() as u32,
        }
    }
}

/// Summary returned once a game has been created or loaded, and embedded in
/// the snapshot SSE event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: GameStatusDto,
    pub created_at: String,
    pub updated_at: String,
    pub max_teams: u32,
    pub max_players_per_team: Option<u32>,
    pub current_round_sequence: u32,
    pub teams: Vec<TeamSummary>,
    pub participants: Vec<ParticipantSummary>,
    pub challenges: Vec<ChallengeSummary>,
    pub active_round: Option<RoundDetail>,
}

impl From<&GameSession> for GameSummary {
    fn from(session: &GameSession) -> Self {
        let mut challenges = session
            .challenges
            .iter()
            .map(|(id, challenge)| ChallengeSummary {
                id: *id,
                title: challenge.title.clone(),
                description: challenge.description.clone(),
                participants_per_team: challenge.participants_per_team,
                position: challenge.position,
            })
            .collect::<Vec<_>>();
        challenges.sort_by_key(|challenge| challenge.position);

        Self {
            id: session.id,
            title: session.title.clone(),
            description: session.description.clone(),
            status: session.status.into(),
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
            max_teams: session.max_teams,
            max_players_per_team: session.max_players_per_team,
            current_round_sequence: session.current_round_sequence,
            teams: session
                .teams
                .keys()
                .filter_map(|id| TeamSummary::from_session(session, *id))
                .collect(),
            participants: session
                .participants
                .keys()
                .filter_map(|id| ParticipantSummary::from_session(session, *id))
                .collect(),
            challenges,
            active_round: session.active_round.as_ref().map(Into::into),
        }
    }
}

/// List entry returned by the games index.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameListItem {
    pub id: Uuid,
    pub title: String,
    pub status: GameStatusDto,
    pub team_count: u32,
    pub participant_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<GameListItemEntity> for GameListItem {
    fn from(entity: GameListItemEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            status: entity.status.into(),
            team_count: entity.team_count,
            participant_count: entity.participant_count,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}
