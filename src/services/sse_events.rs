//! Typed broadcast helpers for the SSE change feed.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        common::GamePhaseSnapshot,
        game::{GameSummary, LineupEntryDto, ParticipantSummary, RoundDetail, TeamSummary},
        public::{ScoreboardDto, TeamScoreDto, VoteTallyDto},
        sse::{
            GameSnapshotEvent, LineupChangedEvent, OutcomeRecordedEvent, ParticipantJoinedEvent,
            ParticipantUpdatedEvent, PhaseChangedEvent, RoundChangedEvent, ScoreboardUpdatedEvent,
            ServerEvent, SystemStatus, TeamCreatedEvent, TeamDeletedEvent, TeamUpdatedEvent,
            VoteTallyEvent,
        },
    },
    state::{
        SharedState,
        aggregate::tally_votes,
        game::{GameSession, Outcome, Round, RoundState},
        scoring::compute_scores,
        state_machine::GamePhase,
    },
};

const EVENT_GAME_SNAPSHOT: &str = "game.snapshot";
const EVENT_PHASE_CHANGED: &str = "phase.changed";
const EVENT_PARTICIPANT_JOINED: &str = "participant.joined";
const EVENT_PARTICIPANT_UPDATED: &str = "participant.updated";
const EVENT_TEAM_CREATED: &str = "team.created";
const EVENT_TEAM_UPDATED: &str = "team.updated";
const EVENT_TEAM_DELETED: &str = "team.deleted";
const EVENT_LINEUP_CHANGED: &str = "lineup.changed";
const EVENT_VOTE_TALLY: &str = "vote.tally";
const EVENT_OUTCOME_RECORDED: &str = "outcome.recorded";
const EVENT_SCOREBOARD_UPDATED: &str = "scoreboard.updated";
const EVENT_ROUND_CHANGED: &str = "round.changed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Compute the scoreboard for the loaded game, in team display order.
/// Only resolved rounds count: outcomes recorded during the action phase
/// stay off every scoreboard until the host reveals them.
pub fn scoreboard(game: &GameSession) -> ScoreboardDto {
    let resolved = game
        .all_rounds()
        .filter(|round| round.state == RoundState::Resolution);
    let scores = compute_scores(game, resolved)
        .into_iter()
        .map(|score| TeamScoreDto::from_score(game, score))
        .collect();
    ScoreboardDto { scores }
}

/// Build the phase snapshot embedded in `phase.changed` and `game.snapshot`.
pub async fn build_phase_snapshot(state: &SharedState, phase: GamePhase) -> GamePhaseSnapshot {
    let degraded = state.is_degraded().await;
    let (game_id, round, board) = state
        .read_current_game(|maybe| match maybe {
            Some(game) => (
                Some(game.id),
                game.active_round.as_ref().map(RoundDetail::from),
                scoreboard_for_phase(game, phase),
            ),
            None => (None, None, None),
        })
        .await;

    GamePhaseSnapshot {
        phase: phase.into(),
        game_id,
        degraded,
        round,
        scoreboard: board,
    }
}

/// Build the full-state event sent to every freshly connected SSE client.
pub async fn build_snapshot_event(state: &SharedState) -> GameSnapshotEvent {
    let phase = state.state_machine_phase().await;
    let snapshot = build_phase_snapshot(state, phase).await;
    let game = state
        .read_current_game(|maybe| maybe.map(GameSummary::from))
        .await;

    GameSnapshotEvent {
        phase: snapshot,
        game,
    }
}

/// Broadcast a gameplay phase change notification to both streams.
pub async fn broadcast_phase_changed(state: &SharedState, phase: GamePhase) {
    let payload = PhaseChangedEvent(build_phase_snapshot(state, phase).await);
    send_player_event(state, EVENT_PHASE_CHANGED, &payload);
    send_host_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast a newly joined participant.
pub fn broadcast_participant_joined(state: &SharedState, participant: ParticipantSummary) {
    let payload = ParticipantJoinedEvent { participant };
    send_player_event(state, EVENT_PARTICIPANT_JOINED, &payload);
    send_host_event(state, EVENT_PARTICIPANT_JOINED, &payload);
}

/// Broadcast a participant rename or team assignment.
pub fn broadcast_participant_updated(state: &SharedState, participant: ParticipantSummary) {
    let payload = ParticipantUpdatedEvent { participant };
    send_player_event(state, EVENT_PARTICIPANT_UPDATED, &payload);
    send_host_event(state, EVENT_PARTICIPANT_UPDATED, &payload);
}

/// Broadcast the creation of a new team.
pub fn broadcast_team_created(state: &SharedState, team: TeamSummary) {
    let payload = TeamCreatedEvent { team };
    send_player_event(state, EVENT_TEAM_CREATED, &payload);
    send_host_event(state, EVENT_TEAM_CREATED, &payload);
}

/// Broadcast that a team has been updated.
pub fn broadcast_team_updated(state: &SharedState, team: TeamSummary) {
    let payload = TeamUpdatedEvent { team };
    send_player_event(state, EVENT_TEAM_UPDATED, &payload);
    send_host_event(state, EVENT_TEAM_UPDATED, &payload);
}

/// Broadcast that a team has been deleted.
pub fn broadcast_team_deleted(state: &SharedState, team_id: Uuid) {
    let payload = TeamDeletedEvent { team_id };
    send_player_event(state, EVENT_TEAM_DELETED, &payload);
    send_host_event(state, EVENT_TEAM_DELETED, &payload);
}

/// Broadcast the full lineup of the round after any toggle.
pub fn broadcast_lineup_changed(state: &SharedState, round: &Round) {
    let payload = LineupChangedEvent {
        round_id: round.id,
        lineup: round
            .lineup
            .iter()
            .map(|entry| LineupEntryDto {
                team_id: entry.team_id,
                participant_id: entry.participant_id,
            })
            .collect(),
    };
    send_player_event(state, EVENT_LINEUP_CHANGED, &payload);
    send_host_event(state, EVENT_LINEUP_CHANGED, &payload);
}

/// Broadcast the recomputed tally for the round.
pub fn broadcast_vote_tally(state: &SharedState, game: &GameSession, round: &Round) {
    let tally: VoteTallyDto = tally_votes(game, round).into();
    let payload = VoteTallyEvent(tally);
    send_player_event(state, EVENT_VOTE_TALLY, &payload);
    send_host_event(state, EVENT_VOTE_TALLY, &payload);
}

/// Broadcast a recorded (or cleared, when `outcome` is `None`) outcome.
pub fn broadcast_outcome_recorded(
    state: &SharedState,
    round_id: Uuid,
    team_id: Uuid,
    outcome: Option<&Outcome>,
) {
    let payload = OutcomeRecordedEvent {
        round_id,
        team_id,
        is_loser: outcome.map(|o| o.is_loser),
        challenge_points: outcome.map(|o| o.challenge_points),
    };
    send_host_event(state, EVENT_OUTCOME_RECORDED, &payload);
}

/// Broadcast the recomputed scoreboard.
pub fn broadcast_scoreboard_updated(state: &SharedState, game: &GameSession) {
    let payload = ScoreboardUpdatedEvent(scoreboard(game));
    send_player_event(state, EVENT_SCOREBOARD_UPDATED, &payload);
    send_host_event(state, EVENT_SCOREBOARD_UPDATED, &payload);
}

/// Broadcast a change of the active round reference.
pub fn broadcast_round_changed(state: &SharedState, round: Option<&Round>) {
    let payload = RoundChangedEvent {
        round: round.map(RoundDetail::from),
    };
    send_player_event(state, EVENT_ROUND_CHANGED, &payload);
    send_host_event(state, EVENT_ROUND_CHANGED, &payload);
}

/// Broadcast the degraded flag to every subscriber.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_player_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_host_event(state, EVENT_SYSTEM_STATUS, &payload);
}

/// Send the full snapshot to both hubs, e.g. after loading a game.
pub async fn broadcast_game_snapshot(state: &SharedState) {
    let payload = build_snapshot_event(state).await;
    send_player_event(state, EVENT_GAME_SNAPSHOT, &payload);
    send_host_event(state, EVENT_GAME_SNAPSHOT, &payload);
}

/// Render the snapshot as a [`ServerEvent`] for a single fresh connection.
pub async fn snapshot_server_event(state: &SharedState) -> Option<ServerEvent> {
    let payload = build_snapshot_event(state).await;
    match ServerEvent::json(Some(EVENT_GAME_SNAPSHOT.to_string()), &payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize snapshot SSE payload");
            None
        }
    }
}

fn scoreboard_for_phase(game: &GameSession, phase: GamePhase) -> Option<Vec<TeamScoreDto>> {
    match phase {
        GamePhase::Resolution | GamePhase::Results => Some(scoreboard(game).scores),
        _ => None,
    }
}

fn send_player_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.player_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize player SSE payload"),
    }
}

fn send_host_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.host_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize host SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::game::Participant};

    fn total_for(board: &ScoreboardDto, team_id: Uuid) -> u32 {
        board
            .scores
            .iter()
            .find(|score| score.team_id == team_id)
            .unwrap()
            .total
    }

    #[test]
    fn unrevealed_outcomes_stay_off_the_scoreboard() {
        let config = AppConfig::default();
        let mut game = GameSession::new("Board".into(), String::new(), 8, None);
        let team_a = game.add_team(&config, "A".into(), None).0;
        let team_b = game.add_team(&config, "B".into(), None).0;
        let voter = Uuid::new_v4();
        game.participants.insert(
            voter,
            Participant {
                user_id: "device-1".into(),
                nickname: "Ana".into(),
                team_id: Some(team_a),
            },
        );

        // Outcome entered while the challenge is still being played.
        let mut round = Round::new(0, None);
        round.state = RoundState::Action;
        round.cast_vote(voter, team_b);
        round.record_outcome(
            team_b,
            Outcome {
                is_loser: true,
                challenge_points: 7,
            },
        );
        game.active_round = Some(round);

        let pending = scoreboard(&game);
        assert!(pending.scores.iter().all(|score| score.total == 0));

        if let Some(round) = game.active_round.as_mut() {
            round.state = RoundState::Resolution;
        }
        let revealed = scoreboard(&game);
        assert_eq!(total_for(&revealed, team_a), 3);
        assert_eq!(total_for(&revealed, team_b), 7);
    }
}
