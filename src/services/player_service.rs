//! Business logic powering the player REST routes. Players are identified by
//! the stable user id their device presents on every request.

use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        game::ParticipantSummary,
        player::{
            CastVoteRequest, CastVoteResponse, ChangeNicknameRequest, JoinGameRequest,
            JoinGameResponse, LineupToggleRequest,
        },
    },
    error::ServiceError,
    services::{
        game_service::{persist_active_round, persist_game},
        sse_events,
    },
    state::{
        SharedState,
        aggregate::can_add_to_lineup,
        game::{GameStatus, Participant},
        state_machine::GamePhase,
    },
};

/// Join the loaded game, or return the existing participant row when the
/// same user id joined before (idempotent).
pub async fn join(
    state: &SharedState,
    user_id: &str,
    request: JoinGameRequest,
) -> Result<JoinGameResponse, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    if user_id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("missing player id".into()));
    }

    let (summary, created) = state
        .with_current_game_mut(|game| {
            if matches!(game.status, GameStatus::Completed | GameStatus::Archived) {
                return Err(ServiceError::InvalidState(
                    "this game is no longer joinable".into(),
                ));
            }

            if let Some((participant_id, _)) = game.participant_by_user(user_id) {
                let summary = ParticipantSummary::from_session(game, participant_id)
                    .ok_or_else(|| ServiceError::NotFound("participant vanished".into()))?;
                return Ok((summary, false));
            }

            let participant_id = Uuid::new_v4();
            game.participants.insert(
                participant_id,
                Participant {
                    user_id: user_id.to_owned(),
                    nickname: request.nickname.trim().to_owned(),
                    team_id: None,
                },
            );
            game.touch();
            let summary = ParticipantSummary::from_session(game, participant_id)
                .ok_or_else(|| ServiceError::NotFound("participant vanished".into()))?;
            Ok((summary, true))
        })
        .await?;

    if created {
        persist_game(state).await?;
        sse_events::broadcast_participant_joined(state, summary.clone());
    }

    Ok(JoinGameResponse {
        participant: summary,
        created,
    })
}

/// Change the caller's own nickname.
pub async fn change_nickname(
    state: &SharedState,
    user_id: &str,
    request: ChangeNicknameRequest,
) -> Result<ParticipantSummary, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let summary = state
        .with_current_game_mut(|game| {
            let (participant_id, _) = game
                .participant_by_user(user_id)
                .ok_or_else(|| ServiceError::NotFound("you have not joined this game".into()))?;
            if let Some(participant) = game.participants.get_mut(&participant_id) {
                participant.nickname = request.nickname.trim().to_owned();
            }
            game.touch();
            ParticipantSummary::from_session(game, participant_id)
                .ok_or_else(|| ServiceError::NotFound("participant vanished".into()))
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_participant_updated(state, summary.clone());
    Ok(summary)
}

/// Toggle a participant in or out of a team's lineup. Only the team's leader
/// may call this, only during leader selection, and never beyond the
/// challenge's required count.
pub async fn toggle_lineup(
    state: &SharedState,
    user_id: &str,
    request: LineupToggleRequest,
) -> Result<(), ServiceError> {
    let phase = state.state_machine_phase().await;
    if phase != GamePhase::LeaderSelection {
        return Err(ServiceError::InvalidState(format!(
            "lineups can only change during leader selection, current phase {phase:?}"
        )));
    }

    let round_snapshot = state
        .with_current_game_mut(|game| {
            let (caller_id, _) = game
                .participant_by_user(user_id)
                .ok_or_else(|| ServiceError::NotFound("you have not joined this game".into()))?;

            let team = game
                .teams
                .get(&request.team_id)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("team `{}` not found", request.team_id))
                })?;
            if team.leader_participant_id != Some(caller_id) {
                return Err(ServiceError::Unauthorized(
                    "only the team leader may change the lineup".into(),
                ));
            }

            let member = game
                .participants
                .get(&request.participant_id)
                .is_some_and(|participant| participant.team_id == Some(request.team_id));
            if !member {
                return Err(ServiceError::InvalidInput(
                    "selected participant is not on this team".into(),
                ));
            }

            // Split the round out so capacity checks can read the game while
            // the round is mutated.
            let mut round = game
                .active_round
                .take()
                .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;

            let selected_here = round
                .lineup_for_team(request.team_id)
                .contains(&request.participant_id);
            let result = if selected_here {
                round.remove_from_lineup(request.participant_id);
                Ok(())
            } else if round.is_selected(request.participant_id) {
                Err(ServiceError::InvalidState(
                    "participant is already in another lineup".into(),
                ))
            } else if !can_add_to_lineup(game, &round, request.team_id) {
                Err(ServiceError::InvalidState(
                    "lineup already has the required number of players".into(),
                ))
            } else {
                round.add_to_lineup(request.team_id, request.participant_id);
                Ok(())
            };

            let snapshot = round.clone();
            game.active_round = Some(round);
            if result.is_ok() {
                game.touch();
            }
            result.map(|()| snapshot)
        })
        .await?;

    persist_active_round(state).await?;
    sse_events::broadcast_lineup_changed(state, &round_snapshot);
    Ok(())
}

/// Cast or change the caller's vote for the predicted losing team. Voting is
/// open to every participant, including lineup members, while the phase is
/// `Voting`.
pub async fn cast_vote(
    state: &SharedState,
    user_id: &str,
    request: CastVoteRequest,
) -> Result<CastVoteResponse, ServiceError> {
    let phase = state.state_machine_phase().await;
    if phase != GamePhase::Voting {
        return Err(ServiceError::InvalidState(format!(
            "votes can only be cast while voting is open, current phase {phase:?}"
        )));
    }

    let (response, game_snapshot, round_snapshot) = state
        .with_current_game_mut(|game| {
            let (caller_id, _) = game
                .participant_by_user(user_id)
                .ok_or_else(|| ServiceError::NotFound("you have not joined this game".into()))?;

            let target_active = game
                .teams
                .get(&request.team_id)
                .is_some_and(|team| team.is_active);
            if !target_active {
                return Err(ServiceError::InvalidInput(
                    "votes must target an active team".into(),
                ));
            }

            let round = game
                .active_round
                .as_mut()
                .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;
            let changed = round.cast_vote(caller_id, request.team_id);
            let response = CastVoteResponse {
                round_id: round.id,
                changed,
            };
            let round_snapshot = round.clone();
            game.touch();
            Ok((response, game.clone(), round_snapshot))
        })
        .await?;

    persist_active_round(state).await?;
    sse_events::broadcast_vote_tally(state, &game_snapshot, &round_snapshot);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::testing::state_with_game,
        state::game::GameSession,
    };

    #[tokio::test]
    async fn joining_twice_returns_the_same_participant() {
        let game = GameSession::new("Party".into(), String::new(), 8, None);
        let state = state_with_game(game, GamePhase::Lobby).await;

        let first = join(
            &state,
            "device-1",
            JoinGameRequest {
                nickname: "Ana".into(),
            },
        )
        .await
        .unwrap();
        assert!(first.created);

        let second = join(
            &state,
            "device-1",
            JoinGameRequest {
                nickname: "Somebody Else".into(),
            },
        )
        .await
        .unwrap();
        assert!(!second.created);
        assert_eq!(second.participant.id, first.participant.id);
        // The original nickname stays; re-joining is a lookup, not an edit.
        assert_eq!(second.participant.nickname, "Ana");

        let count = state
            .read_loaded_game(|game| game.participants.len())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
