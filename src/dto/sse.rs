//! Typed payloads carried over the SSE change feed.
//!
//! Round-scoped events always carry the round id so projections can drop
//! deliveries for rounds that are no longer active. Set-valued data (lineup,
//! tally) is pushed whole rather than as deltas, making re-delivery a no-op.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    common::GamePhaseSnapshot,
    game::{GameSummary, LineupEntryDto, ParticipantSummary, RoundDetail, TeamSummary},
    public::{ScoreboardDto, VoteTallyDto},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from a pre-rendered data string.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`player` or `host`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Optional host token returned when the stream is privileged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Full state push sent right after the handshake (`game.snapshot`).
pub struct GameSnapshotEvent {
    pub phase: GamePhaseSnapshot,
    /// Absent when no game is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the gameplay phase changes (`phase.changed`).
pub struct PhaseChangedEvent(pub GamePhaseSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a participant joins (`participant.joined`).
pub struct ParticipantJoinedEvent {
    pub participant: ParticipantSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a participant's nickname or team changes
/// (`participant.updated`).
pub struct ParticipantUpdatedEvent {
    pub participant: ParticipantSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a new team is created (`team.created`).
pub struct TeamCreatedEvent {
    pub team: TeamSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an existing team is updated (`team.updated`).
pub struct TeamUpdatedEvent {
    pub team: TeamSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a team has been deleted (`team.deleted`).
pub struct TeamDeletedEvent {
    pub team_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast with the full lineup of the round after any toggle
/// (`lineup.changed`).
pub struct LineupChangedEvent {
    pub round_id: Uuid,
    pub lineup: Vec<LineupEntryDto>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast with the recomputed tally after any vote (`vote.tally`).
pub struct VoteTallyEvent(pub VoteTallyDto);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the host records or clears an outcome
/// (`outcome.recorded`).
pub struct OutcomeRecordedEvent {
    pub round_id: Uuid,
    pub team_id: Uuid,
    /// Absent when the outcome was cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_loser: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_points: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast after scores are recomputed (`scoreboard.updated`).
pub struct ScoreboardUpdatedEvent(pub ScoreboardDto);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the active round reference changes (`round.changed`).
pub struct RoundChangedEvent {
    /// Absent when no round is active anymore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundDetail>,
}
