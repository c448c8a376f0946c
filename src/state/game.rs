use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dao::models::{
    ChallengeEntity, GameEntity, GamePhaseEntity, GameStatusEntity, LineupEntryEntity,
    OutcomeEntity, ParticipantEntity, RoundEntity, RoundStateEntity, TeamColorEntity, TeamEntity,
    VoteEntity,
};
use crate::state::state_machine::GamePhase;

/// Lifecycle status of a game record, independent of the gameplay phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Being configured, not yet joinable.
    Draft,
    /// Configured and waiting for players in the lobby.
    Ready,
    /// A play session is in progress.
    Live,
    /// The game finished and shows its final results.
    Completed,
    /// Kept for history only; never joinable again.
    Archived,
}

/// Sub-state of a single round, mirroring the game phase it was left in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Leaders are picking their lineups.
    LeaderSelection,
    /// Votes are being collected.
    Voting,
    /// The challenge is being played.
    Action,
    /// Outcomes revealed, scores graded.
    Resolution,
}

/// HSV color assigned to a team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamColor {
    /// Hue in degrees.
    pub h: f32,
    /// Saturation in `[0, 1]`.
    pub s: f32,
    /// Value in `[0, 1]`.
    pub v: f32,
}

/// Per-game team instance.
#[derive(Debug, Clone)]
pub struct GameTeam {
    /// Display name chosen for the team.
    pub name: String,
    /// HSV color assigned to the team.
    pub color: TeamColor,
    /// Ordering position on the host display.
    pub position: u32,
    /// Inactive teams sit out rounds but keep their history.
    pub is_active: bool,
    /// Participant empowered to set this team's lineup.
    pub leader_participant_id: Option<Uuid>,
}

/// A player who joined the game, keyed by a stable anonymous user id.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Opaque user id issued by the identity provider.
    pub user_id: String,
    /// Display nickname (1-20 chars, trimmed non-empty).
    pub nickname: String,
    /// Team the participant belongs to, if assigned.
    pub team_id: Option<Uuid>,
}

/// A challenge template played during rounds.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Short title shown on the host display.
    pub title: String,
    /// Longer description of the physical challenge.
    pub description: String,
    /// Required lineup size per team; `None` means any nonzero count.
    pub participants_per_team: Option<u32>,
    /// Ordering position in the challenge rotation.
    pub position: u32,
}

/// A participant's prediction of which team will lose the round.
#[derive(Debug, Clone)]
pub struct Vote {
    /// Team the voter predicts will lose.
    pub team_id: Uuid,
    /// When the (latest) vote was cast.
    pub cast_at: SystemTime,
}

/// Host-recorded result of a round's challenge for one team.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Whether this team lost the challenge.
    pub is_loser: bool,
    /// Bonus points assigned by the host for this round.
    pub challenge_points: u32,
}

/// Membership of one participant in one team's lineup for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineupEntry {
    /// Team the participant plays for this round.
    pub team_id: Uuid,
    /// The selected participant.
    pub participant_id: Uuid,
}

/// One instance of a challenge being played.
///
/// Votes are keyed by participant id and outcomes by team id, so upsert
/// semantics (at most one vote per voter, one outcome per team) hold by
/// construction.
#[derive(Debug, Clone)]
pub struct Round {
    /// Stable identifier of the round.
    pub id: Uuid,
    /// Monotonically increasing sequence, unique per game.
    pub sequence: u32,
    /// Sub-state of the round.
    pub state: RoundState,
    /// Challenge played this round, if any is configured.
    pub challenge_id: Option<Uuid>,
    /// Snapshot of the lineup taken when voting opened.
    pub leader_notes: String,
    /// First team marked as loser, filled at resolution.
    pub losing_team_id: Option<Uuid>,
    /// Participants selected to play, at most one team per participant.
    pub lineup: Vec<LineupEntry>,
    /// Latest vote per participant.
    pub votes: IndexMap<Uuid, Vote>,
    /// Recorded outcome per team.
    pub outcomes: IndexMap<Uuid, Outcome>,
}

impl Round {
    /// Build a fresh round in leader selection.
    pub fn new(sequence: u32, challenge_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence,
            state: RoundState::LeaderSelection,
            challenge_id,
            leader_notes: String::new(),
            losing_team_id: None,
            lineup: Vec::new(),
            votes: IndexMap::new(),
            outcomes: IndexMap::new(),
        }
    }

    /// Record or replace the vote of `participant_id`. Returns `true` when the
    /// participant had already voted this round (overwrite, never duplicate).
    pub fn cast_vote(&mut self, participant_id: Uuid, team_id: Uuid) -> bool {
        self.votes
            .insert(
                participant_id,
                Vote {
                    team_id,
                    cast_at: SystemTime::now(),
                },
            )
            .is_some()
    }

    /// Record or replace the outcome for `team_id`.
    pub fn record_outcome(&mut self, team_id: Uuid, outcome: Outcome) {
        self.outcomes.insert(team_id, outcome);
    }

    /// Remove the recorded outcome for `team_id`, if any.
    pub fn clear_outcome(&mut self, team_id: Uuid) -> bool {
        self.outcomes.shift_remove(&team_id).is_some()
    }

    /// Ids of teams marked as losers in this round.
    pub fn losing_team_ids(&self) -> Vec<Uuid> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_loser)
            .map(|(team_id, _)| *team_id)
            .collect()
    }

    /// Participants selected for `team_id` this round.
    pub fn lineup_for_team(&self, team_id: Uuid) -> Vec<Uuid> {
        self.lineup
            .iter()
            .filter(|entry| entry.team_id == team_id)
            .map(|entry| entry.participant_id)
            .collect()
    }

    /// Whether `participant_id` is in any team's lineup this round.
    pub fn is_selected(&self, participant_id: Uuid) -> bool {
        self.lineup
            .iter()
            .any(|entry| entry.participant_id == participant_id)
    }

    /// Add a participant to a team's lineup. Membership is unique per
    /// participant across all teams for the round.
    pub fn add_to_lineup(&mut self, team_id: Uuid, participant_id: Uuid) {
        if !self.is_selected(participant_id) {
            self.lineup.push(LineupEntry {
                team_id,
                participant_id,
            });
        }
    }

    /// Remove a participant from the round lineup. Returns whether an entry
    /// was actually removed.
    pub fn remove_from_lineup(&mut self, participant_id: Uuid) -> bool {
        let before = self.lineup.len();
        self.lineup
            .retain(|entry| entry.participant_id != participant_id);
        before != self.lineup.len()
    }
}

/// Aggregated state for an in-progress or persisted game session.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display title shown on the host screen and join page.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Lifecycle status of the record.
    pub status: GameStatus,
    /// Sequence the next created round will take.
    pub current_round_sequence: u32,
    /// Maximum number of teams the host allows.
    pub max_teams: u32,
    /// Maximum roster size per team; `None` means unlimited.
    pub max_players_per_team: Option<u32>,
    /// Teams in display order, keyed by id.
    pub teams: IndexMap<Uuid, GameTeam>,
    /// Participants keyed by id; unique per (game, user_id).
    pub participants: IndexMap<Uuid, Participant>,
    /// Challenge rotation in position order, keyed by id.
    pub challenges: IndexMap<Uuid, Challenge>,
    /// The round currently being played, if any.
    pub active_round: Option<Round>,
    /// Finished rounds, immutable history in sequence order.
    pub round_history: Vec<Round>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game record was updated.
    pub updated_at: SystemTime,
}

impl GameSession {
    /// Build a new in-memory session with the provided metadata.
    pub fn new(
        title: String,
        description: String,
        max_teams: u32,
        max_players_per_team: Option<u32>,
    ) -> Self {
        let timestamp = SystemTime::now();

        Self {
            id: Uuid::new_v4(),
            title,
            description,
            status: GameStatus::Ready,
            current_round_sequence: 0,
            max_teams,
            max_players_per_team,
            teams: IndexMap::new(),
            participants: IndexMap::new(),
            challenges: IndexMap::new(),
            active_round: None,
            round_history: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Mark the session as updated now.
    pub fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }

    /// Teams currently participating in rounds, in display order.
    pub fn active_teams(&self) -> impl Iterator<Item = (&Uuid, &GameTeam)> {
        self.teams.iter().filter(|(_, team)| team.is_active)
    }

    /// Number of participants assigned to `team_id`.
    pub fn roster_count(&self, team_id: Uuid) -> usize {
        self.participants
            .values()
            .filter(|participant| participant.team_id == Some(team_id))
            .count()
    }

    /// Find a participant by the stable user id of its device.
    pub fn participant_by_user(&self, user_id: &str) -> Option<(Uuid, &Participant)> {
        self.participants
            .iter()
            .find(|(_, participant)| participant.user_id == user_id)
            .map(|(id, participant)| (*id, participant))
    }

    /// Add a team with the first unused palette color when none is provided.
    /// Position is appended at the end of the display order.
    pub fn add_team(
        &mut self,
        config: &AppConfig,
        name: String,
        color: Option<TeamColor>,
    ) -> (Uuid, GameTeam) {
        let used = self
            .teams
            .values()
            .map(|team| team.color.clone())
            .collect::<Vec<_>>();
        let color = color.unwrap_or_else(|| config.first_unused_color(&used));
        let position = self
            .teams
            .values()
            .map(|team| team.position + 1)
            .max()
            .unwrap_or(0);

        let team = GameTeam {
            name,
            color,
            position,
            is_active: true,
            leader_participant_id: None,
        };
        let id = Uuid::new_v4();
        self.teams.insert(id, team.clone());
        (id, team)
    }

    /// Challenge to play for a round `sequence`, rotating through the
    /// configured challenges in position order.
    pub fn challenge_for_sequence(&self, sequence: u32) -> Option<(Uuid, &Challenge)> {
        if self.challenges.is_empty() {
            return None;
        }

        let mut ordered = self.challenges.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|(_, challenge)| challenge.position);
        let index = sequence as usize % ordered.len();
        ordered
            .get(index)
            .map(|(id, challenge)| (**id, *challenge))
    }

    /// Create the next round in leader selection and make it active.
    /// The sequence counter advances so a later round never reuses it.
    pub fn begin_round(&mut self) -> &Round {
        let sequence = self.current_round_sequence;
        let challenge_id = self
            .challenge_for_sequence(sequence)
            .map(|(id, _)| id);
        self.current_round_sequence += 1;
        self.status = GameStatus::Live;
        self.touch();
        self.active_round.insert(Round::new(sequence, challenge_id))
    }

    /// Move the active round into the immutable history.
    pub fn archive_active_round(&mut self) {
        if let Some(round) = self.active_round.take() {
            self.round_history.push(round);
            self.touch();
        }
    }

    /// All rounds, historical then active, in sequence order.
    pub fn all_rounds(&self) -> impl Iterator<Item = &Round> {
        self.round_history.iter().chain(self.active_round.iter())
    }

    /// Destructive lobby reset: deletes all rounds, votes, lineups, outcomes
    /// and participants; reactivates every team and clears leaders.
    pub fn reset_to_lobby(&mut self) {
        self.active_round = None;
        self.round_history.clear();
        self.participants.clear();
        self.current_round_sequence = 0;
        for team in self.teams.values_mut() {
            team.is_active = true;
            team.leader_participant_id = None;
        }
        self.status = GameStatus::Ready;
        self.touch();
    }

    /// Convert to the persisted representation, tagging the current phase.
    pub fn to_entity(&self, phase: GamePhase) -> GameEntity {
        GameEntity {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status.into(),
            phase: phase.into(),
            active_round_id: self.active_round.as_ref().map(|round| round.id),
            current_round_sequence: self.current_round_sequence,
            max_teams: self.max_teams,
            max_players_per_team: self.max_players_per_team,
            teams: self
                .teams
                .iter()
                .map(|(id, team)| (*id, team.clone()).into())
                .collect(),
            participants: self
                .participants
                .iter()
                .map(|(id, participant)| (*id, participant.clone()).into())
                .collect(),
            challenges: self
                .challenges
                .iter()
                .map(|(id, challenge)| (*id, challenge.clone()).into())
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Rebuild a session (and the phase it was left in) from persisted rows.
    /// Rounds other than the active one land in the history, sorted by
    /// sequence.
    pub fn restore(entity: GameEntity, mut rounds: Vec<RoundEntity>) -> (Self, GamePhase) {
        rounds.sort_by_key(|round| round.sequence);

        let mut active_round = None;
        let mut round_history = Vec::with_capacity(rounds.len());
        for round in rounds {
            let runtime: Round = round.into();
            if Some(runtime.id) == entity.active_round_id {
                active_round = Some(runtime);
            } else {
                round_history.push(runtime);
            }
        }

        let phase = entity.phase.into();
        let session = Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            status: entity.status.into(),
            current_round_sequence: entity.current_round_sequence,
            max_teams: entity.max_teams,
            max_players_per_team: entity.max_players_per_team,
            teams: entity
                .teams
                .into_iter()
                .map(|team| (team.id, team.into()))
                .collect(),
            participants: entity
                .participants
                .into_iter()
                .map(|participant| (participant.id, participant.into()))
                .collect(),
            challenges: entity
                .challenges
                .into_iter()
                .map(|challenge| (challenge.id, challenge.into()))
                .collect(),
            active_round,
            round_history,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        };

        (session, phase)
    }
}

impl From<GameStatusEntity> for GameStatus {
    fn from(value: GameStatusEntity) -> Self {
        match value {
            GameStatusEntity::Draft => GameStatus::Draft,
            GameStatusEntity::Ready => GameStatus::Ready,
            GameStatusEntity::Live => GameStatus::Live,
            GameStatusEntity::Completed => GameStatus::Completed,
            GameStatusEntity::Archived => GameStatus::Archived,
        }
    }
}

impl From<GameStatus> for GameStatusEntity {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::Draft => GameStatusEntity::Draft,
            GameStatus::Ready => GameStatusEntity::Ready,
            GameStatus::Live => GameStatusEntity::Live,
            GameStatus::Completed => GameStatusEntity::Completed,
            GameStatus::Archived => GameStatusEntity::Archived,
        }
    }
}

impl From<GamePhaseEntity> for GamePhase {
    fn from(value: GamePhaseEntity) -> Self {
        match value {
            GamePhaseEntity::Lobby => GamePhase::Lobby,
            GamePhaseEntity::LeaderSelection => GamePhase::LeaderSelection,
            GamePhaseEntity::Voting => GamePhase::Voting,
            GamePhaseEntity::Action => GamePhase::Action,
            GamePhaseEntity::Resolution => GamePhase::Resolution,
            GamePhaseEntity::Results => GamePhase::Results,
        }
    }
}

impl From<GamePhase> for GamePhaseEntity {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Lobby => GamePhaseEntity::Lobby,
            GamePhase::LeaderSelection => GamePhaseEntity::LeaderSelection,
            GamePhase::Voting => GamePhaseEntity::Voting,
            GamePhase::Action => GamePhaseEntity::Action,
            GamePhase::Resolution => GamePhaseEntity::Resolution,
            GamePhase::Results => GamePhaseEntity::Results,
        }
    }
}

impl From<RoundStateEntity> for RoundState {
    fn from(value: RoundStateEntity) -> Self {
        match value {
            RoundStateEntity::LeaderSelection => RoundState::LeaderSelection,
            RoundStateEntity::Voting => RoundState::Voting,
            RoundStateEntity::Action => RoundState::Action,
            RoundStateEntity::Resolution => RoundState::Resolution,
        }
    }
}

impl From<RoundState> for RoundStateEntity {
    fn from(value: RoundState) -> Self {
        match value {
            RoundState::LeaderSelection => RoundStateEntity::LeaderSelection,
            RoundState::Voting => RoundStateEntity::Voting,
            RoundState::Action => RoundStateEntity::Action,
            RoundState::Resolution => RoundStateEntity::Resolution,
        }
    }
}

impl From<TeamColorEntity> for TeamColor {
    fn from(value: TeamColorEntity) -> Self {
        Self {
            h: value.h,
            s: value.s,
            v: value.v,
        }
    }
}

impl From<TeamColor> for TeamColorEntity {
    fn from(value: TeamColor) -> Self {
        Self {
            h: value.h,
            s: value.s,
            v: value.v,
        }
    }
}

impl From<TeamEntity> for GameTeam {
    fn from(value: TeamEntity) -> Self {
        Self {
            name: value.name,
            color: value.color.into(),
            position: value.position,
            is_active: value.is_active,
            leader_participant_id: value.leader_participant_id,
        }
    }
}

impl From<(Uuid, GameTeam)> for TeamEntity {
    fn from((id, team): (Uuid, GameTeam)) -> Self {
        Self {
            id,
            name: team.name,
            color: team.color.into(),
            position: team.position,
            is_active: team.is_active,
            leader_participant_id: team.leader_participant_id,
        }
    }
}

impl From<ParticipantEntity> for Participant {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            user_id: value.user_id,
            nickname: value.nickname,
            team_id: value.team_id,
        }
    }
}

impl From<(Uuid, Participant)> for ParticipantEntity {
    fn from((id, participant): (Uuid, Participant)) -> Self {
        Self {
            id,
            user_id: participant.user_id,
            nickname: participant.nickname,
            team_id: participant.team_id,
        }
    }
}

impl From<ChallengeEntity> for Challenge {
    fn from(value: ChallengeEntity) -> Self {
        Self {
            title: value.title,
            description: value.description,
            participants_per_team: value.participants_per_team,
            position: value.position,
        }
    }
}

impl From<(Uuid, Challenge)> for ChallengeEntity {
    fn from((id, challenge): (Uuid, Challenge)) -> Self {
        Self {
            id,
            title: challenge.title,
            description: challenge.description,
            participants_per_team: challenge.participants_per_team,
            position: challenge.position,
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            sequence: value.sequence,
            state: value.state.into(),
            challenge_id: value.challenge_id,
            leader_notes: value.leader_notes,
            losing_team_id: value.losing_team_id,
            lineup: value
                .lineup
                .into_iter()
                .map(|entry| LineupEntry {
                    team_id: entry.team_id,
                    participant_id: entry.participant_id,
                })
                .collect(),
            votes: value
                .votes
                .into_iter()
                .map(|vote| {
                    (
                        vote.participant_id,
                        Vote {
                            team_id: vote.team_id,
                            cast_at: vote.cast_at,
                        },
                    )
                })
                .collect(),
            outcomes: value
                .outcomes
                .into_iter()
                .map(|outcome| {
                    (
                        outcome.team_id,
                        Outcome {
                            is_loser: outcome.is_loser,
                            challenge_points: outcome.challenge_points,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl From<(Uuid, &Round)> for RoundEntity {
    fn from((game_id, round): (Uuid, &Round)) -> Self {
        Self {
            id: round.id,
            game_id,
            sequence: round.sequence,
            state: round.state.into(),
            challenge_id: round.challenge_id,
            leader_notes: round.leader_notes.clone(),
            losing_team_id: round.losing_team_id,
            lineup: round
                .lineup
                .iter()
                .map(|entry| LineupEntryEntity {
                    team_id: entry.team_id,
                    participant_id: entry.participant_id,
                })
                .collect(),
            votes: round
                .votes
                .iter()
                .map(|(participant_id, vote)| VoteEntity {
                    participant_id: *participant_id,
                    team_id: vote.team_id,
                    cast_at: vote.cast_at,
                })
                .collect(),
            outcomes: round
                .outcomes
                .iter()
                .map(|(team_id, outcome)| OutcomeEntity {
                    team_id: *team_id,
                    is_loser: outcome.is_loser,
                    challenge_points: outcome.challenge_points,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new("Summer bash".into(), String::new(), 8, None)
    }

    #[test]
    fn revote_overwrites_without_duplicating() {
        let mut round = Round::new(0, None);
        let voter = Uuid::new_v4();
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();

        assert!(!round.cast_vote(voter, team_a));
        assert!(round.cast_vote(voter, team_b));

        assert_eq!(round.votes.len(), 1);
        assert_eq!(round.votes.get(&voter).unwrap().team_id, team_b);
    }

    #[test]
    fn lineup_membership_is_unique_per_round() {
        let mut round = Round::new(0, None);
        let player = Uuid::new_v4();
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();

        round.add_to_lineup(team_a, player);
        round.add_to_lineup(team_b, player);

        assert_eq!(round.lineup.len(), 1);
        assert_eq!(round.lineup_for_team(team_a), vec![player]);
        assert!(round.lineup_for_team(team_b).is_empty());

        assert!(round.remove_from_lineup(player));
        assert!(!round.remove_from_lineup(player));
    }

    #[test]
    fn losing_team_ids_only_lists_marked_losers() {
        let mut round = Round::new(0, None);
        let loser = Uuid::new_v4();
        let winner = Uuid::new_v4();

        assert!(round.losing_team_ids().is_empty());

        round.record_outcome(
            winner,
            Outcome {
                is_loser: false,
                challenge_points: 5,
            },
        );
        round.record_outcome(
            loser,
            Outcome {
                is_loser: true,
                challenge_points: 0,
            },
        );

        assert_eq!(round.losing_team_ids(), vec![loser]);
        assert!(round.clear_outcome(loser));
        assert!(round.losing_team_ids().is_empty());
    }

    #[test]
    fn participant_lookup_by_user_id_returns_existing_row() {
        let mut game = session();
        let participant_id = Uuid::new_v4();
        game.participants.insert(
            participant_id,
            Participant {
                user_id: "device-7".into(),
                nickname: "Iris".into(),
                team_id: None,
            },
        );

        let (found, participant) = game.participant_by_user("device-7").unwrap();
        assert_eq!(found, participant_id);
        assert_eq!(participant.nickname, "Iris");
        assert!(game.participant_by_user("device-8").is_none());
    }

    #[test]
    fn round_sequences_are_monotonic() {
        let mut game = session();
        assert_eq!(game.begin_round().sequence, 0);
        game.archive_active_round();
        assert_eq!(game.begin_round().sequence, 1);
        game.archive_active_round();
        assert_eq!(game.begin_round().sequence, 2);
    }

    #[test]
    fn reset_to_lobby_clears_everything() {
        let config = AppConfig::default();
        let mut game = session();
        let (team_id, _) = game.add_team(&config, "Red".into(), None);
        game.add_team(&config, "Blue".into(), None);

        let participant_id = Uuid::new_v4();
        game.participants.insert(
            participant_id,
            Participant {
                user_id: "device-1".into(),
                nickname: "Ana".into(),
                team_id: Some(team_id),
            },
        );
        game.teams.get_mut(&team_id).unwrap().leader_participant_id = Some(participant_id);
        game.teams.get_mut(&team_id).unwrap().is_active = false;

        game.begin_round();
        game.active_round
            .as_mut()
            .unwrap()
            .cast_vote(participant_id, team_id);
        game.archive_active_round();
        game.begin_round();

        game.reset_to_lobby();

        assert!(game.active_round.is_none());
        assert!(game.round_history.is_empty());
        assert!(game.participants.is_empty());
        assert_eq!(game.current_round_sequence, 0);
        assert_eq!(game.status, GameStatus::Ready);
        for team in game.teams.values() {
            assert!(team.is_active);
            assert!(team.leader_participant_id.is_none());
        }
    }

    #[test]
    fn challenge_rotation_wraps_in_position_order() {
        let mut game = session();
        let second = Uuid::new_v4();
        let first = Uuid::new_v4();
        game.challenges.insert(
            second,
            Challenge {
                title: "Relay".into(),
                description: String::new(),
                participants_per_team: Some(2),
                position: 1,
            },
        );
        game.challenges.insert(
            first,
            Challenge {
                title: "Tug of war".into(),
                description: String::new(),
                participants_per_team: None,
                position: 0,
            },
        );

        assert_eq!(game.challenge_for_sequence(0).unwrap().0, first);
        assert_eq!(game.challenge_for_sequence(1).unwrap().0, second);
        assert_eq!(game.challenge_for_sequence(2).unwrap().0, first);
    }

    #[test]
    fn entity_round_trip_preserves_rounds_and_phase() {
        let config = AppConfig::default();
        let mut game = session();
        game.add_team(&config, "Red".into(), None);
        game.add_team(&config, "Blue".into(), None);
        game.begin_round();
        game.archive_active_round();
        game.begin_round();

        let entity = game.to_entity(GamePhase::Voting);
        let rounds = game
            .all_rounds()
            .map(|round| (game.id, round).into())
            .collect::<Vec<RoundEntity>>();

        let (restored, phase) = GameSession::restore(entity, rounds);
        assert_eq!(phase, GamePhase::Voting);
        assert_eq!(restored.teams.len(), 2);
        assert_eq!(restored.round_history.len(), 1);
        assert_eq!(restored.active_round.as_ref().unwrap().sequence, 1);
        assert_eq!(restored.current_round_sequence, 2);
    }
}
