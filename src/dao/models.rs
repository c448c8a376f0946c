use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Lifecycle status of a persisted game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusEntity {
    Draft,
    Ready,
    Live,
    Completed,
    Archived,
}

/// Gameplay phase the game was persisted in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhaseEntity {
    Lobby,
    LeaderSelection,
    Voting,
    Action,
    Resolution,
    Results,
}

/// Sub-state a round was persisted in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundStateEntity {
    LeaderSelection,
    Voting,
    Action,
    Resolution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamColorEntity {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl PartialEq for TeamColorEntity {
    fn eq(&self, other: &Self) -> bool {
        self.h.to_bits() == other.h.to_bits()
            && self.s.to_bits() == other.s.to_bits()
            && self.v.to_bits() == other.v.to_bits()
    }
}

impl Eq for TeamColorEntity {}

/// Representation of a team stored in persistence and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name chosen for the team.
    pub name: String,
    /// HSV color assigned to the team.
    pub color: TeamColorEntity,
    /// Ordering position on the host display.
    pub position: u32,
    /// Whether the team takes part in rounds.
    pub is_active: bool,
    /// Participant leading the team, if one was appointed.
    pub leader_participant_id: Option<Uuid>,
}

/// A player row, unique per `(game, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Stable identifier for the participant.
    pub id: Uuid,
    /// Opaque user id the player's device presents.
    pub user_id: String,
    /// Display nickname.
    pub nickname: String,
    /// Team the participant belongs to, if assigned.
    pub team_id: Option<Uuid>,
}

/// A challenge template in the game's rotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeEntity {
    /// Stable identifier for the challenge.
    pub id: Uuid,
    /// Short title shown on the host display.
    pub title: String,
    /// Longer description of the physical challenge.
    pub description: String,
    /// Required lineup size per team; absent means any nonzero count.
    pub participants_per_team: Option<u32>,
    /// Ordering position in the rotation.
    pub position: u32,
}

/// One participant's membership in a team's round lineup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineupEntryEntity {
    /// Team the participant plays for.
    pub team_id: Uuid,
    /// The selected participant.
    pub participant_id: Uuid,
}

/// Latest vote of one participant in a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEntity {
    /// The voter.
    pub participant_id: Uuid,
    /// Team predicted to lose.
    pub team_id: Uuid,
    /// When the vote was (last) cast.
    pub cast_at: SystemTime,
}

/// Host-recorded outcome for one team in a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeEntity {
    /// The graded team.
    pub team_id: Uuid,
    /// Whether this team lost the challenge.
    pub is_loser: bool,
    /// Bonus points assigned by the host.
    pub challenge_points: u32,
}

/// A persisted round, one document per round keyed by `(game_id, id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Stable identifier for the round.
    pub id: Uuid,
    /// Owning game.
    pub game_id: Uuid,
    /// Sequence number, unique within the game.
    pub sequence: u32,
    /// Sub-state the round was left in.
    pub state: RoundStateEntity,
    /// Challenge played this round, if any.
    pub challenge_id: Option<Uuid>,
    /// Lineup summary snapshot taken when voting opened.
    pub leader_notes: String,
    /// First team marked as loser.
    pub losing_team_id: Option<Uuid>,
    /// Selected participants, one team per participant.
    pub lineup: Vec<LineupEntryEntity>,
    /// Latest vote per participant.
    pub votes: Vec<VoteEntity>,
    /// Recorded outcome per team.
    pub outcomes: Vec<OutcomeEntity>,
}

/// Aggregate game entity persisted by the storage layer. Rounds are stored
/// separately as [`RoundEntity`] rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display title of the game session.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Lifecycle status of the record.
    pub status: GameStatusEntity,
    /// Gameplay phase the game was persisted in.
    pub phase: GamePhaseEntity,
    /// Round currently being played, if any.
    pub active_round_id: Option<Uuid>,
    /// Sequence the next round will take.
    pub current_round_sequence: u32,
    /// Maximum number of teams.
    pub max_teams: u32,
    /// Maximum roster size per team; absent means unlimited.
    pub max_players_per_team: Option<u32>,
    /// Teams in display order.
    pub teams: Vec<TeamEntity>,
    /// Joined participants.
    pub participants: Vec<ParticipantEntity>,
    /// Challenge rotation.
    pub challenges: Vec<ChallengeEntity>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
}

/// Aggregate game list item entity (subset of GameEntity) persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameListItemEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display title of the game session.
    pub title: String,
    /// Lifecycle status of the record.
    pub status: GameStatusEntity,
    /// Number of teams configured.
    pub team_count: u32,
    /// Number of participants who joined.
    pub participant_count: u32,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
}

impl From<GameEntity> for GameListItemEntity {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            status: entity.status,
            team_count: entity.teams.len() as u32,
            participant_count: entity.participants.len() as u32,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
