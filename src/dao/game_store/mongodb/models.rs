use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    ChallengeEntity, GameEntity, GamePhaseEntity, GameStatusEntity, LineupEntryEntity,
    OutcomeEntity, ParticipantEntity, RoundEntity, RoundStateEntity, TeamEntity, VoteEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    description: String,
    status: GameStatusEntity,
    phase: GamePhaseEntity,
    active_round_id: Option<Uuid>,
    current_round_sequence: u32,
    max_teams: u32,
    max_players_per_team: Option<u32>,
    teams: Vec<TeamEntity>,
    participants: Vec<ParticipantEntity>,
    challenges: Vec<ChallengeEntity>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status,
            phase: value.phase,
            active_round_id: value.active_round_id,
            current_round_sequence: value.current_round_sequence,
            max_teams: value.max_teams,
            max_players_per_team: value.max_players_per_team,
            teams: value.teams,
            participants: value.participants,
            challenges: value.challenges,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            status: value.status,
            phase: value.phase,
            active_round_id: value.active_round_id,
            current_round_sequence: value.current_round_sequence,
            max_teams: value.max_teams,
            max_players_per_team: value.max_players_per_team,
            teams: value.teams,
            participants: value.participants,
            challenges: value.challenges,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoundDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    pub game_id: Uuid,
    sequence: u32,
    state: RoundStateEntity,
    challenge_id: Option<Uuid>,
    leader_notes: String,
    losing_team_id: Option<Uuid>,
    lineup: Vec<LineupEntryEntity>,
    votes: Vec<MongoVoteDocument>,
    outcomes: Vec<OutcomeEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoVoteDocument {
    participant_id: Uuid,
    team_id: Uuid,
    cast_at: DateTime,
}

impl From<RoundEntity> for MongoRoundDocument {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            sequence: value.sequence,
            state: value.state,
            challenge_id: value.challenge_id,
            leader_notes: value.leader_notes,
            losing_team_id: value.losing_team_id,
            lineup: value.lineup,
            votes: value
                .votes
                .into_iter()
                .map(|vote| MongoVoteDocument {
                    participant_id: vote.participant_id,
                    team_id: vote.team_id,
                    cast_at: DateTime::from_system_time(vote.cast_at),
                })
                .collect(),
            outcomes: value.outcomes,
        }
    }
}

impl From<MongoRoundDocument> for RoundEntity {
    fn from(value: MongoRoundDocument) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            sequence: value.sequence,
            state: value.state,
            challenge_id: value.challenge_id,
            leader_notes: value.leader_notes,
            losing_team_id: value.losing_team_id,
            lineup: value.lineup,
            votes: value
                .votes
                .into_iter()
                .map(|vote| VoteEntity {
                    participant_id: vote.participant_id,
                    team_id: vote.team_id,
                    cast_at: vote.cast_at.to_system_time(),
                })
                .collect(),
            outcomes: value.outcomes,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
