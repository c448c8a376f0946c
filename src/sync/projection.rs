//! Deterministic fold of the SSE change feed into client-visible state.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dto::{
    game::{GameSummary, LineupEntryDto, ParticipantSummary, RoundDetail, TeamSummary},
    phase::VisiblePhase,
    public::{ScoreboardDto, VoteTallyDto},
    sse::{
        GameSnapshotEvent, LineupChangedEvent, OutcomeRecordedEvent, ParticipantJoinedEvent,
        ParticipantUpdatedEvent, PhaseChangedEvent, RoundChangedEvent, ScoreboardUpdatedEvent,
        SystemStatus, TeamCreatedEvent, TeamDeletedEvent, TeamUpdatedEvent, VoteTallyEvent,
    },
};

/// Outcome entry mirrored from `outcome.recorded` deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome {
    pub is_loser: bool,
    pub challenge_points: u32,
}

/// Client projection of the game, built from one `game.snapshot` plus the
/// incremental events that follow it.
///
/// Every application is idempotent: set-valued payloads (lineup, tally,
/// scoreboard) replace wholesale, and entity payloads upsert by id, so a
/// re-delivered event leaves the projection unchanged. Events scoped to a
/// round that is no longer active are dropped, and any change of the active
/// round reference (including to `None`) tears the round-scoped state down
/// before the new round is installed.
#[derive(Debug, Default)]
pub struct ClientProjection {
    phase: Option<VisiblePhase>,
    degraded: bool,
    game: Option<GameSummary>,
    round: Option<RoundDetail>,
    lineup: Vec<LineupEntryDto>,
    tally: Option<VoteTallyDto>,
    outcomes: IndexMap<Uuid, RecordedOutcome>,
    scoreboard: Option<ScoreboardDto>,
}

impl ClientProjection {
    /// Empty projection awaiting its first snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Option<VisiblePhase> {
        self.phase
    }

    pub fn degraded(&self) -> bool {
        self.degraded
    }

    pub fn game(&self) -> Option<&GameSummary> {
        self.game.as_ref()
    }

    pub fn round(&self) -> Option<&RoundDetail> {
        self.round.as_ref()
    }

    pub fn lineup(&self) -> &[LineupEntryDto] {
        &self.lineup
    }

    pub fn tally(&self) -> Option<&VoteTallyDto> {
        self.tally.as_ref()
    }

    pub fn outcome(&self, team_id: Uuid) -> Option<&RecordedOutcome> {
        self.outcomes.get(&team_id)
    }

    pub fn scoreboard(&self) -> Option<&ScoreboardDto> {
        self.scoreboard.as_ref()
    }

    /// Replace the whole projection from a `game.snapshot` delivery.
    pub fn apply_snapshot(&mut self, event: GameSnapshotEvent) {
        self.phase = Some(event.phase.phase);
        self.degraded = event.phase.degraded;
        self.game = event.game;
        self.scoreboard = event
            .phase
            .scoreboard
            .map(|scores| ScoreboardDto { scores });
        self.set_round(event.phase.round);
    }

    /// Apply a `phase.changed` delivery.
    pub fn apply_phase_changed(&mut self, event: PhaseChangedEvent) {
        let snapshot = event.0;
        self.phase = Some(snapshot.phase);
        self.degraded = snapshot.degraded;
        if let Some(scores) = snapshot.scoreboard {
            self.scoreboard = Some(ScoreboardDto { scores });
        }
        self.set_round(snapshot.round);
    }

    /// Apply a `participant.joined` delivery (upsert by id).
    pub fn apply_participant_joined(&mut self, event: ParticipantJoinedEvent) {
        self.upsert_participant(event.participant);
    }

    /// Apply a `participant.updated` delivery (upsert by id).
    pub fn apply_participant_updated(&mut self, event: ParticipantUpdatedEvent) {
        self.upsert_participant(event.participant);
    }

    /// Apply a `team.created` delivery (upsert by id).
    pub fn apply_team_created(&mut self, event: TeamCreatedEvent) {
        self.upsert_team(event.team);
    }

    /// Apply a `team.updated` delivery (upsert by id).
    pub fn apply_team_updated(&mut self, event: TeamUpdatedEvent) {
        self.upsert_team(event.team);
    }

    /// Apply a `team.deleted` delivery. Members of the team become
    /// unassigned, mirroring the server-side rule.
    pub fn apply_team_deleted(&mut self, event: TeamDeletedEvent) {
        if let Some(game) = self.game.as_mut() {
            game.teams.retain(|team| team.id != event.team_id);
            for participant in &mut game.participants {
                if participant.team_id == Some(event.team_id) {
                    participant.team_id = None;
                }
            }
        }
    }

    /// Apply a `lineup.changed` delivery. Dropped when it names a round that
    /// is not the active one.
    pub fn apply_lineup_changed(&mut self, event: LineupChangedEvent) {
        if !self.is_active_round(event.round_id) {
            return;
        }
        if let Some(round) = self.round.as_mut() {
            round.lineup = event.lineup.clone();
        }
        self.lineup = event.lineup;
    }

    /// Apply a `vote.tally` delivery. Dropped when it names a round that is
    /// not the active one.
    pub fn apply_vote_tally(&mut self, event: VoteTallyEvent) {
        let tally = event.0;
        if !self.is_active_round(tally.round_id) {
            return;
        }
        if let Some(round) = self.round.as_mut() {
            round.vote_count = tally.total;
        }
        self.tally = Some(tally);
    }

    /// Apply an `outcome.recorded` delivery. A payload without `is_loser`
    /// means the outcome was cleared. Dropped when it names a round that is
    /// not the active one.
    pub fn apply_outcome_recorded(&mut self, event: OutcomeRecordedEvent) {
        if !self.is_active_round(event.round_id) {
            return;
        }
        match event.is_loser {
            Some(is_loser) => {
                self.outcomes.insert(
                    event.team_id,
                    RecordedOutcome {
                        is_loser,
                        challenge_points: event.challenge_points.unwrap_or(0),
                    },
                );
            }
            None => {
                self.outcomes.shift_remove(&event.team_id);
            }
        }
    }

    /// Apply a `scoreboard.updated` delivery.
    pub fn apply_scoreboard_updated(&mut self, event: ScoreboardUpdatedEvent) {
        self.scoreboard = Some(event.0);
    }

    /// Apply a `round.changed` delivery, tearing down round-scoped state
    /// whenever the active round reference changes.
    pub fn apply_round_changed(&mut self, event: RoundChangedEvent) {
        self.set_round(event.round);
    }

    /// Apply a `system.status` delivery.
    pub fn apply_system_status(&mut self, event: SystemStatus) {
        self.degraded = event.degraded;
    }

    fn is_active_round(&self, round_id: Uuid) -> bool {
        self.round.as_ref().is_some_and(|round| round.id == round_id)
    }

    fn set_round(&mut self, next: Option<RoundDetail>) {
        let current_id = self.round.as_ref().map(|round| round.id);
        if current_id != next.as_ref().map(|round| round.id) {
            self.lineup.clear();
            self.tally = None;
            self.outcomes.clear();
        }
        if let Some(round) = &next {
            self.lineup = round.lineup.clone();
        }
        self.round = next;
    }

    fn upsert_participant(&mut self, participant: ParticipantSummary) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => game.participants.push(participant),
        }
    }

    fn upsert_team(&mut self, team: TeamSummary) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game.teams.iter_mut().find(|t| t.id == team.id) {
            Some(existing) => *existing = team,
            None => game.teams.push(team),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{
        common::GamePhaseSnapshot,
        game::{GameStatusDto, RoundStateDto},
        public::TeamTallyDto,
    };

    fn round(id: Uuid, lineup: Vec<LineupEntryDto>) -> RoundDetail {
        RoundDetail {
            id,
            sequence: 1,
            state: RoundStateDto::Voting,
            challenge_id: None,
            leader_notes: String::new(),
            losing_team_id: None,
            lineup,
            vote_count: 0,
        }
    }

    fn tally(round_id: Uuid, team_id: Uuid, count: u32) -> VoteTallyDto {
        VoteTallyDto {
            round_id,
            total: count,
            entries: vec![TeamTallyDto {
                team_id,
                count,
                percentage: 100,
            }],
        }
    }

    fn game(participants: Vec<ParticipantSummary>) -> GameSummary {
        GameSummary {
            id: Uuid::new_v4(),
            title: "quiz night".into(),
            description: String::new(),
            status: GameStatusDto::Live,
            created_at: String::new(),
            updated_at: String::new(),
            max_teams: 4,
            max_players_per_team: None,
            current_round_sequence: 1,
            teams: Vec::new(),
            participants,
            challenges: Vec::new(),
            active_round: None,
        }
    }

    fn projection_with_round(round_detail: RoundDetail) -> ClientProjection {
        let mut projection = ClientProjection::new();
        projection.apply_round_changed(RoundChangedEvent {
            round: Some(round_detail),
        });
        projection
    }

    #[test]
    fn tally_for_stale_round_is_dropped() {
        let active = Uuid::new_v4();
        let stale = Uuid::new_v4();
        let mut projection = projection_with_round(round(active, Vec::new()));

        projection.apply_vote_tally(VoteTallyEvent(tally(stale, Uuid::new_v4(), 3)));

        assert!(projection.tally().is_none());
        assert_eq!(projection.round().unwrap().vote_count, 0);
    }

    #[test]
    fn round_change_tears_down_round_scoped_state() {
        let first = Uuid::new_v4();
        let team = Uuid::new_v4();
        let mut projection = projection_with_round(round(first, Vec::new()));

        projection.apply_vote_tally(VoteTallyEvent(tally(first, team, 2)));
        projection.apply_outcome_recorded(OutcomeRecordedEvent {
            round_id: first,
            team_id: team,
            is_loser: Some(true),
            challenge_points: Some(4),
        });
        assert!(projection.tally().is_some());
        assert!(projection.outcome(team).is_some());

        let second = Uuid::new_v4();
        let entry = LineupEntryDto {
            team_id: team,
            participant_id: Uuid::new_v4(),
        };
        projection.apply_round_changed(RoundChangedEvent {
            round: Some(round(second, vec![entry])),
        });

        assert!(projection.tally().is_none());
        assert!(projection.outcome(team).is_none());
        assert_eq!(projection.lineup().len(), 1);
        assert_eq!(projection.round().unwrap().id, second);
    }

    #[test]
    fn round_change_to_none_clears_round_scope() {
        let id = Uuid::new_v4();
        let team = Uuid::new_v4();
        let mut projection = projection_with_round(round(id, Vec::new()));
        projection.apply_vote_tally(VoteTallyEvent(tally(id, team, 1)));

        projection.apply_round_changed(RoundChangedEvent { round: None });

        assert!(projection.round().is_none());
        assert!(projection.tally().is_none());
        assert!(projection.lineup().is_empty());
    }

    #[test]
    fn redelivered_lineup_is_a_noop() {
        let id = Uuid::new_v4();
        let entry = LineupEntryDto {
            team_id: Uuid::new_v4(),
            participant_id: Uuid::new_v4(),
        };
        let mut projection = projection_with_round(round(id, Vec::new()));

        let event = || LineupChangedEvent {
            round_id: id,
            lineup: vec![entry.clone()],
        };
        projection.apply_lineup_changed(event());
        projection.apply_lineup_changed(event());

        assert_eq!(projection.lineup().len(), 1);
        assert_eq!(projection.round().unwrap().lineup.len(), 1);
    }

    #[test]
    fn participant_joined_upserts_by_id() {
        let mut projection = ClientProjection::new();
        projection.apply_snapshot(GameSnapshotEvent {
            phase: GamePhaseSnapshot {
                phase: VisiblePhase::Lobby,
                game_id: None,
                degraded: false,
                round: None,
                scoreboard: None,
            },
            game: Some(game(Vec::new())),
        });

        let participant = ParticipantSummary {
            id: Uuid::new_v4(),
            nickname: "ada".into(),
            team_id: None,
        };
        projection.apply_participant_joined(ParticipantJoinedEvent {
            participant: participant.clone(),
        });
        projection.apply_participant_joined(ParticipantJoinedEvent {
            participant: ParticipantSummary {
                nickname: "ada l".into(),
                ..participant.clone()
            },
        });

        let participants = &projection.game().unwrap().participants;
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].nickname, "ada l");
    }

    #[test]
    fn team_deleted_unassigns_members() {
        let team_id = Uuid::new_v4();
        let mut projection = ClientProjection::new();
        projection.apply_snapshot(GameSnapshotEvent {
            phase: GamePhaseSnapshot {
                phase: VisiblePhase::Lobby,
                game_id: None,
                degraded: false,
                round: None,
                scoreboard: None,
            },
            game: Some(game(vec![ParticipantSummary {
                id: Uuid::new_v4(),
                nickname: "bob".into(),
                team_id: Some(team_id),
            }])),
        });

        projection.apply_team_deleted(TeamDeletedEvent { team_id });

        let game = projection.game().unwrap();
        assert!(game.teams.iter().all(|team| team.id != team_id));
        assert_eq!(game.participants[0].team_id, None);
    }
}
