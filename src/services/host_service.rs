//! Business logic powering the host REST routes. These helpers coordinate
//! storage persistence, in-memory state updates, and state-machine transitions
//! while honouring the single-transition-at-a-time requirement.

use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::RoundEntity,
    dto::{
        game::{ChallengeSummary, GameListItem, GameSummary, RoundDetail, TeamSummary},
        host::{
            AssignTeamRequest, ChallengeInput, CreateGameRequest, JoinLinkResponse,
            OutcomeRequest, RenameParticipantRequest, ReorderChallengesRequest, SetLeaderRequest,
            TeamInput, UpdateChallengeRequest, UpdateGameSettingsRequest, UpdateTeamRequest,
        },
        public::ScoreboardDto,
    },
    error::ServiceError,
    services::{
        game_service::{persist_active_round, persist_game, persist_game_as},
        sse_events,
    },
    state::{
        SharedState,
        aggregate::{all_lineups_ready, teams_ready_for_round},
        game::{Challenge, GameSession, GameStatus, Outcome, RoundState},
        state_machine::{GameEvent, GamePhase},
        transitions::run_transition_with_broadcast,
    },
};

/// Minimum number of active teams a playable game must keep.
const MIN_ACTIVE_TEAMS: usize = 2;

fn ensure_phase(actual: GamePhase, expected: GamePhase) -> Result<(), ServiceError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "operation requires phase {expected:?}, current phase {actual:?}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Read-only projections
// ---------------------------------------------------------------------------

pub async fn list_games(state: &SharedState) -> Result<Vec<GameListItem>, ServiceError> {
    let store = state.require_game_store().await?;
    let entities = store.list_games().await?;
    Ok(entities.into_iter().map(Into::into).collect())
}

/// Full snapshot of the loaded game.
pub async fn current_game_summary(state: &SharedState) -> Result<GameSummary, ServiceError> {
    state.read_loaded_game(|game| GameSummary::from(game)).await
}

/// Current scoreboard of the loaded game.
pub async fn current_scoreboard(state: &SharedState) -> Result<ScoreboardDto, ServiceError> {
    state.read_loaded_game(sse_events::scoreboard).await
}

/// Join link for the loaded game, built from the configured base URL or the
/// serving origin.
pub async fn join_link(
    state: &SharedState,
    origin: Option<&str>,
) -> Result<JoinLinkResponse, ServiceError> {
    let game_id = state.read_loaded_game(|game| game.id).await?;
    let url = state.config().join_link(origin, game_id);
    Ok(JoinLinkResponse { url })
}

// ---------------------------------------------------------------------------
// Game bootstrap / lifecycle operations
// ---------------------------------------------------------------------------

/// Create a new game, make it the loaded game, and persist it.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let mut game = GameSession::new(
        request.title.trim().to_owned(),
        request.description,
        request.max_teams,
        request.max_players_per_team,
    );

    if request.teams.len() as u32 > request.max_teams {
        return Err(ServiceError::InvalidInput(format!(
            "{} teams exceed the maximum of {}",
            request.teams.len(),
            request.max_teams
        )));
    }
    for team in request.teams {
        game.add_team(
            state.config(),
            team.name.trim().to_owned(),
            team.color.map(Into::into),
        );
    }
    for (position, challenge) in request.challenges.into_iter().enumerate() {
        game.challenges.insert(
            Uuid::new_v4(),
            Challenge {
                title: challenge.title.trim().to_owned(),
                description: challenge.description,
                participants_per_team: challenge.participants_per_team,
                position: position as u32,
            },
        );
    }

    let summary = GameSummary::from(&game);
    let entity = game.to_entity(GamePhase::Lobby);

    let store = state.require_game_store().await?;
    store.save_game(entity).await?;

    state
        .with_current_game_slot_mut(|slot| {
            slot.replace(game);
        })
        .await;
    state.restore_phase(GamePhase::Lobby).await;

    sse_events::broadcast_game_snapshot(state).await;
    Ok(summary)
}

/// Load a persisted game together with its rounds and make it current.
pub async fn load_game(state: &SharedState, id: Uuid) -> Result<GameSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let Some(entity) = store.find_game(id).await? else {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    };
    let rounds = store.list_rounds(id).await?;

    let (game, phase) = GameSession::restore(entity, rounds);
    let summary = GameSummary::from(&game);
    debug!(game_id = %id, ?phase, "restored game from storage");

    state
        .with_current_game_slot_mut(|slot| {
            slot.replace(game);
        })
        .await;
    state.restore_phase(phase).await;

    sse_events::broadcast_game_snapshot(state).await;
    Ok(summary)
}

/// Delete a persisted game and all of its rounds. The loaded game may only be
/// deleted outside of a running session.
pub async fn delete_game(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let current_game_id = state.read_current_game(|game| game.map(|g| g.id)).await;

    if current_game_id == Some(id) {
        let phase = state.state_machine_phase().await;
        if !matches!(phase, GamePhase::Lobby | GamePhase::Results) {
            return Err(ServiceError::InvalidState(
                "cannot delete a game while a round is in progress".into(),
            ));
        }

        state
            .with_current_game_slot_mut(|slot| {
                slot.take();
            })
            .await;
        state.restore_phase(GamePhase::Lobby).await;
    }

    let store = state.require_game_store().await?;
    store.delete_rounds(id).await?;
    let deleted = store.delete_game(id).await?;
    if deleted {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("game `{id}` not found")))
    }
}

/// Apply a partial settings update to the loaded game. Concurrent edits are
/// last-write-wins.
pub async fn update_settings(
    state: &SharedState,
    request: UpdateGameSettingsRequest,
) -> Result<GameSummary, ServiceError> {
    let summary = state
        .with_current_game_mut(|game| {
            if let Some(title) = request.title {
                let trimmed = title.trim().to_owned();
                if trimmed.is_empty() {
                    return Err(ServiceError::InvalidInput("title must not be empty".into()));
                }
                game.title = trimmed;
            }
            if let Some(description) = request.description {
                game.description = description;
            }
            if let Some(status) = request.status {
                game.status = match status {
                    crate::dto::host::GameStatusInput::Draft => GameStatus::Draft,
                    crate::dto::host::GameStatusInput::Ready => GameStatus::Ready,
                    crate::dto::host::GameStatusInput::Completed => GameStatus::Completed,
                    crate::dto::host::GameStatusInput::Archived => GameStatus::Archived,
                };
            }
            if let Some(max_teams) = request.max_teams {
                if (game.teams.len() as u32) > max_teams {
                    return Err(ServiceError::InvalidInput(format!(
                        "{} existing teams exceed the new maximum of {max_teams}",
                        game.teams.len()
                    )));
                }
                game.max_teams = max_teams;
            }
            if let Some(limit) = request.max_players_per_team {
                game.max_players_per_team = limit;
            }
            game.touch();
            Ok(GameSummary::from(&*game))
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_game_snapshot(state).await;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Team operations
// ---------------------------------------------------------------------------

/// Add a team to the loaded game. Only allowed in the lobby.
pub async fn create_team(
    state: &SharedState,
    request: TeamInput,
) -> Result<TeamSummary, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    ensure_phase(state.state_machine_phase().await, GamePhase::Lobby)?;

    let summary = state
        .with_current_game_mut(|game| {
            if game.teams.len() as u32 >= game.max_teams {
                return Err(ServiceError::InvalidState(format!(
                    "maximum of {} teams reached",
                    game.max_teams
                )));
            }
            let (team_id, team) = game.add_team(
                state.config(),
                request.name.trim().to_owned(),
                request.color.map(Into::into),
            );
            game.touch();
            Ok(TeamSummary {
                id: team_id,
                name: team.name,
                color: team.color.into(),
                position: team.position,
                is_active: team.is_active,
                leader_participant_id: None,
                member_count: 0,
            })
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_team_created(state, summary.clone());
    Ok(summary)
}

/// Apply a partial update to a team. Deactivation keeps the active floor.
pub async fn update_team(
    state: &SharedState,
    team_id: Uuid,
    request: UpdateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let summary = state
        .with_current_game_mut(|game| {
            if request.is_active == Some(false) {
                let active = game.active_teams().count();
                let was_active = game
                    .teams
                    .get(&team_id)
                    .is_some_and(|team| team.is_active);
                if was_active && active <= MIN_ACTIVE_TEAMS {
                    return Err(ServiceError::InvalidState(format!(
                        "at least {MIN_ACTIVE_TEAMS} active teams are required"
                    )));
                }
            }

            let team = game
                .teams
                .get_mut(&team_id)
                .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;

            if let Some(name) = request.name {
                let trimmed = name.trim().to_owned();
                if trimmed.is_empty() {
                    return Err(ServiceError::InvalidInput("name must not be empty".into()));
                }
                team.name = trimmed;
            }
            if let Some(color) = request.color {
                team.color = color.into();
            }
            if let Some(position) = request.position {
                team.position = position;
            }
            if let Some(is_active) = request.is_active {
                team.is_active = is_active;
            }
            game.touch();
            TeamSummary::from_session(game, team_id)
                .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_team_updated(state, summary.clone());
    Ok(summary)
}

/// Remove a team. Only allowed in the lobby, and never below the active
/// floor. Members of the deleted team become unassigned.
pub async fn delete_team(state: &SharedState, team_id: Uuid) -> Result<(), ServiceError> {
    ensure_phase(state.state_machine_phase().await, GamePhase::Lobby)?;

    state
        .with_current_game_mut(|game| {
            let Some(team) = game.teams.get(&team_id) else {
                return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
            };
            if team.is_active && game.active_teams().count() <= MIN_ACTIVE_TEAMS {
                return Err(ServiceError::InvalidState(format!(
                    "at least {MIN_ACTIVE_TEAMS} active teams are required"
                )));
            }

            game.teams.shift_remove(&team_id);
            for participant in game.participants.values_mut() {
                if participant.team_id == Some(team_id) {
                    participant.team_id = None;
                }
            }
            game.touch();
            Ok(())
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_team_deleted(state, team_id);
    Ok(())
}

/// Move a participant to a team (or unassign with `team_id: null`).
pub async fn assign_participant(
    state: &SharedState,
    participant_id: Uuid,
    request: AssignTeamRequest,
) -> Result<(), ServiceError> {
    let summary = state
        .with_current_game_mut(|game| {
            if let Some(team_id) = request.team_id {
                if !game.teams.contains_key(&team_id) {
                    return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
                }
                if let Some(limit) = game.max_players_per_team {
                    if game.roster_count(team_id) as u32 >= limit {
                        return Err(ServiceError::InvalidState(format!(
                            "team roster is full ({limit} players)"
                        )));
                    }
                }
            }

            let participant = game.participants.get_mut(&participant_id).ok_or_else(|| {
                ServiceError::NotFound(format!("participant `{participant_id}` not found"))
            })?;
            participant.team_id = request.team_id;
            game.touch();
            crate::dto::game::ParticipantSummary::from_session(game, participant_id).ok_or_else(
                || ServiceError::NotFound(format!("participant `{participant_id}` not found")),
            )
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_participant_updated(state, summary);
    Ok(())
}

/// Appoint or clear a team leader. The leader must be a roster member.
pub async fn set_team_leader(
    state: &SharedState,
    team_id: Uuid,
    request: SetLeaderRequest,
) -> Result<TeamSummary, ServiceError> {
    let summary = state
        .with_current_game_mut(|game| {
            if let Some(participant_id) = request.participant_id {
                let member = game
                    .participants
                    .get(&participant_id)
                    .is_some_and(|participant| participant.team_id == Some(team_id));
                if !member {
                    return Err(ServiceError::InvalidInput(format!(
                        "participant `{participant_id}` is not on team `{team_id}`"
                    )));
                }
            }

            let team = game
                .teams
                .get_mut(&team_id)
                .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;
            team.leader_participant_id = request.participant_id;
            game.touch();
            TeamSummary::from_session(game, team_id)
                .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_team_updated(state, summary.clone());
    Ok(summary)
}

/// Rename a participant on the host's behalf.
pub async fn rename_participant(
    state: &SharedState,
    participant_id: Uuid,
    request: RenameParticipantRequest,
) -> Result<(), ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let summary = state
        .with_current_game_mut(|game| {
            let participant = game.participants.get_mut(&participant_id).ok_or_else(|| {
                ServiceError::NotFound(format!("participant `{participant_id}` not found"))
            })?;
            participant.nickname = request.nickname.trim().to_owned();
            game.touch();
            crate::dto::game::ParticipantSummary::from_session(game, participant_id).ok_or_else(
                || ServiceError::NotFound(format!("participant `{participant_id}` not found")),
            )
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_participant_updated(state, summary);
    Ok(())
}

// ---------------------------------------------------------------------------
// Challenge operations
// ---------------------------------------------------------------------------

/// Append a challenge to the rotation.
pub async fn create_challenge(
    state: &SharedState,
    request: ChallengeInput,
) -> Result<ChallengeSummary, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let summary = state
        .with_current_game_mut(|game| {
            let position = game
                .challenges
                .values()
                .map(|challenge| challenge.position + 1)
                .max()
                .unwrap_or(0);
            let id = Uuid::new_v4();
            game.challenges.insert(
                id,
                Challenge {
                    title: request.title.trim().to_owned(),
                    description: request.description,
                    participants_per_team: request.participants_per_team,
                    position,
                },
            );
            game.touch();
            let challenge = &game.challenges[&id];
            Ok(ChallengeSummary {
                id,
                title: challenge.title.clone(),
                description: challenge.description.clone(),
                participants_per_team: challenge.participants_per_team,
                position: challenge.position,
            })
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_game_snapshot(state).await;
    Ok(summary)
}

/// Apply a partial update to a challenge.
pub async fn update_challenge(
    state: &SharedState,
    challenge_id: Uuid,
    request: UpdateChallengeRequest,
) -> Result<ChallengeSummary, ServiceError> {
    let summary = state
        .with_current_game_mut(|game| {
            let challenge = game.challenges.get_mut(&challenge_id).ok_or_else(|| {
                ServiceError::NotFound(format!("challenge `{challenge_id}` not found"))
            })?;

            if let Some(title) = request.title {
                let trimmed = title.trim().to_owned();
                if trimmed.is_empty() {
                    return Err(ServiceError::InvalidInput("title must not be empty".into()));
                }
                challenge.title = trimmed;
            }
            if let Some(description) = request.description {
                challenge.description = description;
            }
            if let Some(required) = request.participants_per_team {
                challenge.participants_per_team = required;
            }
            game.touch();
            let challenge = &game.challenges[&challenge_id];
            Ok(ChallengeSummary {
                id: challenge_id,
                title: challenge.title.clone(),
                description: challenge.description.clone(),
                participants_per_team: challenge.participants_per_team,
                position: challenge.position,
            })
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_game_snapshot(state).await;
    Ok(summary)
}

/// Remove a challenge from the rotation.
pub async fn delete_challenge(state: &SharedState, challenge_id: Uuid) -> Result<(), ServiceError> {
    state
        .with_current_game_mut(|game| {
            if game.challenges.shift_remove(&challenge_id).is_none() {
                return Err(ServiceError::NotFound(format!(
                    "challenge `{challenge_id}` not found"
                )));
            }
            game.touch();
            Ok(())
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_game_snapshot(state).await;
    Ok(())
}

/// Replace the rotation order. The list must name every challenge exactly once.
pub async fn reorder_challenges(
    state: &SharedState,
    request: ReorderChallengesRequest,
) -> Result<(), ServiceError> {
    state
        .with_current_game_mut(|game| {
            let known: std::collections::HashSet<Uuid> =
                game.challenges.keys().copied().collect();
            let given: std::collections::HashSet<Uuid> = request.order.iter().copied().collect();
            if known != given || request.order.len() != game.challenges.len() {
                return Err(ServiceError::InvalidInput(
                    "order must list every challenge exactly once".into(),
                ));
            }

            for (position, id) in request.order.iter().enumerate() {
                if let Some(challenge) = game.challenges.get_mut(id) {
                    challenge.position = position as u32;
                }
            }
            game.touch();
            Ok(())
        })
        .await?;

    persist_game(state).await?;
    sse_events::broadcast_game_snapshot(state).await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase transitions
// ---------------------------------------------------------------------------

/// Leave the lobby and open the first (or next) round in leader selection.
pub async fn start_round(state: &SharedState) -> Result<RoundDetail, ServiceError> {
    let detail = run_transition_with_broadcast(state, GameEvent::StartRound, || async {
        let detail = state
            .with_current_game_mut(|game| {
                if !teams_ready_for_round(game) {
                    return Err(ServiceError::InvalidState(
                        "at least two active teams with members are required".into(),
                    ));
                }
                let round = game.begin_round();
                Ok(RoundDetail::from(round))
            })
            .await?;

        persist_active_round(state).await?;
        persist_game_as(state, GamePhase::LeaderSelection).await?;
        Ok(detail)
    })
    .await?;

    state
        .read_current_game(|maybe| {
            if let Some(game) = maybe {
                sse_events::broadcast_round_changed(state, game.active_round.as_ref());
            }
        })
        .await;
    Ok(detail)
}

/// Freeze the lineups and open the vote. Refused while any active team's
/// lineup is not ready.
pub async fn open_voting(state: &SharedState) -> Result<RoundDetail, ServiceError> {
    run_transition_with_broadcast(state, GameEvent::OpenVoting, || async {
        let detail = state
            .with_current_game_mut(|game| {
                let Some(round) = game.active_round.take() else {
                    return Err(ServiceError::InvalidState("no active round".into()));
                };
                if !all_lineups_ready(game, &round) {
                    game.active_round = Some(round);
                    return Err(ServiceError::InvalidState(
                        "every active team needs a complete lineup before voting".into(),
                    ));
                }

                let notes = lineup_summary(game, &round);
                let mut round = round;
                round.leader_notes = notes;
                round.state = RoundState::Voting;
                let detail = RoundDetail::from(&round);
                game.active_round = Some(round);
                game.touch();
                Ok(detail)
            })
            .await?;

        persist_active_round(state).await?;
        persist_game_as(state, GamePhase::Voting).await?;
        Ok(detail)
    })
    .await
}

/// Close the vote and move to the action phase.
pub async fn lock_voting(state: &SharedState) -> Result<RoundDetail, ServiceError> {
    run_transition_with_broadcast(state, GameEvent::LockVoting, || async {
        let detail = state
            .with_current_game_mut(|game| {
                let round = game
                    .active_round
                    .as_mut()
                    .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;
                round.state = RoundState::Action;
                let detail = RoundDetail::from(&*round);
                game.touch();
                Ok(detail)
            })
            .await?;

        persist_active_round(state).await?;
        persist_game_as(state, GamePhase::Action).await?;
        Ok(detail)
    })
    .await
}

/// Record (upsert) the outcome for one team of the active round.
pub async fn record_outcome(
    state: &SharedState,
    team_id: Uuid,
    request: OutcomeRequest,
) -> Result<(), ServiceError> {
    let phase = state.state_machine_phase().await;
    if !matches!(phase, GamePhase::Action | GamePhase::Resolution) {
        return Err(ServiceError::InvalidState(format!(
            "outcomes can only be recorded during action or resolution, current phase {phase:?}"
        )));
    }

    let round_id = state
        .with_current_game_mut(|game| {
            if !game.teams.contains_key(&team_id) {
                return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
            }
            let round = game
                .active_round
                .as_mut()
                .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;
            round.record_outcome(
                team_id,
                Outcome {
                    is_loser: request.is_loser,
                    challenge_points: request.challenge_points,
                },
            );
            let round_id = round.id;
            game.touch();
            Ok(round_id)
        })
        .await?;

    persist_active_round(state).await?;
    let outcome = Outcome {
        is_loser: request.is_loser,
        challenge_points: request.challenge_points,
    };
    sse_events::broadcast_outcome_recorded(state, round_id, team_id, Some(&outcome));
    Ok(())
}

/// Remove a recorded outcome, e.g. after a mis-click.
pub async fn clear_outcome(state: &SharedState, team_id: Uuid) -> Result<(), ServiceError> {
    let round_id = state
        .with_current_game_mut(|game| {
            let round = game
                .active_round
                .as_mut()
                .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;
            if !round.clear_outcome(team_id) {
                return Err(ServiceError::NotFound(format!(
                    "no outcome recorded for team `{team_id}`"
                )));
            }
            let round_id = round.id;
            game.touch();
            Ok(round_id)
        })
        .await?;

    persist_active_round(state).await?;
    sse_events::broadcast_outcome_recorded(state, round_id, team_id, None);
    Ok(())
}

/// Reveal the round result. Refused until at least one team is marked loser.
pub async fn reveal_outcome(state: &SharedState) -> Result<RoundDetail, ServiceError> {
    let detail = run_transition_with_broadcast(state, GameEvent::RevealOutcome, || async {
        let detail = state
            .with_current_game_mut(|game| {
                let round = game
                    .active_round
                    .as_mut()
                    .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;
                let losers = round.losing_team_ids();
                if losers.is_empty() {
                    return Err(ServiceError::InvalidState(
                        "at least one team must be marked as loser before revealing".into(),
                    ));
                }
                round.losing_team_id = losers.first().copied();
                round.state = RoundState::Resolution;
                let detail = RoundDetail::from(&*round);
                game.touch();
                Ok(detail)
            })
            .await?;

        persist_active_round(state).await?;
        persist_game_as(state, GamePhase::Resolution).await?;
        Ok(detail)
    })
    .await?;

    state
        .read_current_game(|maybe| {
            if let Some(game) = maybe {
                sse_events::broadcast_scoreboard_updated(state, game);
            }
        })
        .await;
    Ok(detail)
}

/// Archive the finished round and open the next one in leader selection.
///
/// In-memory state mutates before the persistence writes. A storage failure
/// aborts the phase change but keeps the new round in memory; reloading the
/// game resyncs from storage.
pub async fn next_round(state: &SharedState) -> Result<RoundDetail, ServiceError> {
    let detail = run_transition_with_broadcast(state, GameEvent::NextRound, || async {
        let (finished, detail) = state
            .with_current_game_mut(|game| {
                let finished = game
                    .active_round
                    .as_ref()
                    .map(|round| RoundEntity::from((game.id, round)))
                    .ok_or_else(|| ServiceError::InvalidState("no active round".into()))?;
                game.archive_active_round();
                let round = game.begin_round();
                Ok((finished, RoundDetail::from(round)))
            })
            .await?;

        let store = state.require_game_store().await?;
        store.save_round(finished).await?;
        persist_active_round(state).await?;
        persist_game_as(state, GamePhase::LeaderSelection).await?;
        Ok(detail)
    })
    .await?;

    state
        .read_current_game(|maybe| {
            if let Some(game) = maybe {
                sse_events::broadcast_round_changed(state, game.active_round.as_ref());
            }
        })
        .await;
    Ok(detail)
}

/// Finish the game: archive the last round and show the final standings.
pub async fn end_game(state: &SharedState) -> Result<ScoreboardDto, ServiceError> {
    let board = run_transition_with_broadcast(state, GameEvent::EndGame, || async {
        let finished = state
            .with_current_game_mut(|game| {
                let finished = game
                    .active_round
                    .as_ref()
                    .map(|round| RoundEntity::from((game.id, round)));
                game.archive_active_round();
                game.status = GameStatus::Completed;
                game.touch();
                Ok(finished)
            })
            .await?;

        let store = state.require_game_store().await?;
        if let Some(round) = finished {
            store.save_round(round).await?;
        }
        persist_game_as(state, GamePhase::Results).await?;

        state.read_loaded_game(sse_events::scoreboard).await
    })
    .await?;

    sse_events::broadcast_round_changed(state, None);
    state
        .read_current_game(|maybe| {
            if let Some(game) = maybe {
                sse_events::broadcast_scoreboard_updated(state, game);
            }
        })
        .await;
    Ok(board)
}

/// Destructive lobby reset: wipe rounds, votes, lineups, outcomes and
/// participants, reactivate teams and return to the lobby. Storage failures
/// surface as errors and are not rolled back.
pub async fn reset_lobby(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let summary = run_transition_with_broadcast(state, GameEvent::ResetLobby, || async {
        let game_id = state
            .with_current_game_mut(|game| {
                game.reset_to_lobby();
                Ok(game.id)
            })
            .await?;

        let store = state.require_game_store().await?;
        store.delete_rounds(game_id).await?;
        persist_game_as(state, GamePhase::Lobby).await?;

        state.read_loaded_game(|game| GameSummary::from(game)).await
    })
    .await?;

    sse_events::broadcast_round_changed(state, None);
    sse_events::broadcast_game_snapshot(state).await;
    Ok(summary)
}

/// Human-readable lineup summary frozen into the round when voting opens.
fn lineup_summary(game: &GameSession, round: &crate::state::game::Round) -> String {
    let mut parts = Vec::new();
    for (team_id, team) in game.active_teams() {
        let names = round
            .lineup_for_team(*team_id)
            .into_iter()
            .filter_map(|participant_id| {
                game.participants
                    .get(&participant_id)
                    .map(|participant| participant.nickname.clone())
            })
            .collect::<Vec<_>>();
        parts.push(format!("{}: {}", team.name, names.join(", ")));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::testing::state_with_game,
        state::game::{Participant, Round},
    };

    fn staffed_game() -> (GameSession, Vec<Uuid>, Vec<Uuid>) {
        let config = AppConfig::default();
        let mut game = GameSession::new("Live".into(), String::new(), 8, None);
        let teams: Vec<Uuid> = ["Red", "Blue"]
            .iter()
            .map(|name| game.add_team(&config, (*name).into(), None).0)
            .collect();
        let members = teams
            .iter()
            .map(|team_id| {
                let id = Uuid::new_v4();
                game.participants.insert(
                    id,
                    Participant {
                        user_id: format!("device-{id}"),
                        nickname: "p".into(),
                        team_id: Some(*team_id),
                    },
                );
                id
            })
            .collect();
        (game, teams, members)
    }

    #[tokio::test]
    async fn voting_opens_only_once_every_lineup_is_ready() {
        let (mut game, teams, members) = staffed_game();
        let mut round = Round::new(0, None);
        round.add_to_lineup(teams[0], members[0]);
        game.active_round = Some(round);
        let state = state_with_game(game, GamePhase::LeaderSelection).await;

        let err = open_voting(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::LeaderSelection
        );

        state
            .with_current_game_mut(|game| {
                if let Some(round) = game.active_round.as_mut() {
                    round.add_to_lineup(teams[1], members[1]);
                }
                Ok(())
            })
            .await
            .unwrap();

        let detail = open_voting(&state).await.unwrap();
        assert_eq!(detail.lineup.len(), 2);
        assert_eq!(state.state_machine_phase().await, GamePhase::Voting);

        lock_voting(&state).await.unwrap();
        assert_eq!(state.state_machine_phase().await, GamePhase::Action);
    }

    #[tokio::test]
    async fn reveal_requires_a_marked_loser() {
        let (mut game, teams, _members) = staffed_game();
        let mut round = Round::new(0, None);
        round.state = RoundState::Action;
        game.active_round = Some(round);
        let state = state_with_game(game, GamePhase::Action).await;

        record_outcome(
            &state,
            teams[0],
            OutcomeRequest {
                is_loser: false,
                challenge_points: 4,
            },
        )
        .await
        .unwrap();

        let err = reveal_outcome(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(state.state_machine_phase().await, GamePhase::Action);

        record_outcome(
            &state,
            teams[1],
            OutcomeRequest {
                is_loser: true,
                challenge_points: 0,
            },
        )
        .await
        .unwrap();

        let detail = reveal_outcome(&state).await.unwrap();
        assert_eq!(detail.losing_team_id, Some(teams[1]));
        assert_eq!(state.state_machine_phase().await, GamePhase::Resolution);
    }
}
