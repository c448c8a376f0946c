use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Game-wide phase driving which actions are valid for hosts and players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Players join, pick nicknames, and get assigned to teams.
    Lobby,
    /// Team leaders select their lineups for the current round.
    LeaderSelection,
    /// Players predict which team will lose the challenge.
    Voting,
    /// The physical challenge is being played, votes are locked.
    Action,
    /// Outcomes are revealed and scores graded.
    Resolution,
    /// Final leaderboard is displayed; the game is over.
    Results,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Host starts (or resumes) a round from the lobby.
    StartRound,
    /// Host opens voting once every active team has a valid lineup.
    OpenVoting,
    /// Host locks voting before the challenge begins.
    LockVoting,
    /// Host reveals the recorded outcomes for the round.
    RevealOutcome,
    /// Host advances to the next round after resolution.
    NextRound,
    /// Host ends the game and shows the final results.
    EndGame,
    /// Host resets everything back to a fresh lobby.
    ResetLobby,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: GamePhase,
        /// Current phase.
        actual: GamePhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: GamePhase,
    /// Phase the state machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<GamePhase>,
}

/// State machine implementing the round/phase flow of a game session.
///
/// Transition validity lives here; data guards (lineup readiness, outcome
/// presence, team floor) are re-validated by the service layer against fresh
/// game state inside the transition work closure.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Lobby,
            version: 0,
            pending: None,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a state machine positioned at `phase`, used when resuming a
    /// persisted game session.
    pub fn restore(phase: GamePhase) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Lobby, GameEvent::StartRound) => GamePhase::LeaderSelection,
            (GamePhase::LeaderSelection, GameEvent::OpenVoting) => GamePhase::Voting,
            (GamePhase::Voting, GameEvent::LockVoting) => GamePhase::Action,
            (GamePhase::Action, GameEvent::RevealOutcome) => GamePhase::Resolution,
            (GamePhase::Resolution, GameEvent::NextRound) => GamePhase::LeaderSelection,
            (GamePhase::Resolution, GameEvent::EndGame) => GamePhase::Results,
            (_, GameEvent::ResetLobby) => GamePhase::Lobby,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GamePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_lobby() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::Lobby);
    }

    #[test]
    fn full_happy_path_through_two_rounds() {
        let mut sm = GameStateMachine::new();

        assert_eq!(
            apply(&mut sm, GameEvent::StartRound),
            GamePhase::LeaderSelection
        );
        assert_eq!(apply(&mut sm, GameEvent::OpenVoting), GamePhase::Voting);
        assert_eq!(apply(&mut sm, GameEvent::LockVoting), GamePhase::Action);
        assert_eq!(
            apply(&mut sm, GameEvent::RevealOutcome),
            GamePhase::Resolution
        );
        assert_eq!(
            apply(&mut sm, GameEvent::NextRound),
            GamePhase::LeaderSelection
        );
        assert_eq!(apply(&mut sm, GameEvent::OpenVoting), GamePhase::Voting);
        assert_eq!(apply(&mut sm, GameEvent::LockVoting), GamePhase::Action);
        assert_eq!(
            apply(&mut sm, GameEvent::RevealOutcome),
            GamePhase::Resolution
        );
        assert_eq!(apply(&mut sm, GameEvent::EndGame), GamePhase::Results);
    }

    #[test]
    fn reset_is_valid_from_any_phase() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartRound);
        apply(&mut sm, GameEvent::OpenVoting);
        assert_eq!(apply(&mut sm, GameEvent::ResetLobby), GamePhase::Lobby);

        let mut finished = GameStateMachine::restore(GamePhase::Results);
        assert_eq!(
            apply(&mut finished, GameEvent::ResetLobby),
            GamePhase::Lobby
        );
    }

    #[test]
    fn voting_cannot_open_from_lobby() {
        let mut sm = GameStateMachine::new();
        let err = sm.plan(GameEvent::OpenVoting).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, GamePhase::Lobby);
                assert_eq!(invalid.event, GameEvent::OpenVoting);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn end_game_only_from_resolution() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartRound);
        assert!(matches!(
            sm.plan(GameEvent::EndGame),
            Err(PlanError::InvalidTransition(_))
        ));
    }

    #[test]
    fn second_plan_rejected_while_pending() {
        let mut sm = GameStateMachine::new();
        let _plan = sm.plan(GameEvent::StartRound).unwrap();
        assert_eq!(
            sm.plan(GameEvent::StartRound).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn apply_rejects_mismatched_plan_id() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::StartRound).unwrap();
        let bogus = Uuid::new_v4();
        match sm.apply(bogus).unwrap_err() {
            ApplyError::IdMismatch { expected, got } => {
                assert_eq!(expected, plan.id);
                assert_eq!(got, bogus);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The original plan is still applicable.
        assert_eq!(sm.apply(plan.id).unwrap(), GamePhase::LeaderSelection);
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::StartRound).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), GamePhase::Lobby);
    }

    #[test]
    fn restore_positions_phase_without_pending() {
        let sm = GameStateMachine::restore(GamePhase::Action);
        assert_eq!(sm.phase(), GamePhase::Action);
        assert_eq!(sm.snapshot().pending, None);
    }
}
