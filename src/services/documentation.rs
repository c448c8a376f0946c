use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Crowd Clash Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::player_stream,
        crate::routes::sse::host_stream,
        crate::routes::public::game_snapshot,
        crate::routes::public::current_phase,
        crate::routes::public::current_tally,
        crate::routes::public::leaderboard,
        crate::routes::player::join,
        crate::routes::player::change_nickname,
        crate::routes::player::toggle_lineup,
        crate::routes::player::cast_vote,
        crate::routes::host::list_games,
        crate::routes::host::create_game,
        crate::routes::host::load_game,
        crate::routes::host::delete_game,
        crate::routes::host::current_game,
        crate::routes::host::update_settings,
        crate::routes::host::scoreboard,
        crate::routes::host::join_link,
        crate::routes::host::create_team,
        crate::routes::host::update_team,
        crate::routes::host::delete_team,
        crate::routes::host::set_team_leader,
        crate::routes::host::assign_participant,
        crate::routes::host::rename_participant,
        crate::routes::host::create_challenge,
        crate::routes::host::update_challenge,
        crate::routes::host::delete_challenge,
        crate::routes::host::reorder_challenges,
        crate::routes::host::start_round,
        crate::routes::host::open_voting,
        crate::routes::host::lock_voting,
        crate::routes::host::record_outcome,
        crate::routes::host::clear_outcome,
        crate::routes::host::reveal_outcome,
        crate::routes::host::next_round,
        crate::routes::host::end_game,
        crate::routes::host::reset_lobby,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::common::TeamColorDto,
            crate::dto::common::GamePhaseSnapshot,
            crate::dto::game::GameStatusDto,
            crate::dto::game::RoundStateDto,
            crate::dto::game::TeamSummary,
            crate::dto::game::ParticipantSummary,
            crate::dto::game::ChallengeSummary,
            crate::dto::game::LineupEntryDto,
            crate::dto::game::RoundDetail,
            crate::dto::game::GameSummary,
            crate::dto::game::GameListItem,
            crate::dto::host::CreateGameRequest,
            crate::dto::host::TeamInput,
            crate::dto::host::ChallengeInput,
            crate::dto::host::UpdateGameSettingsRequest,
            crate::dto::host::GameStatusInput,
            crate::dto::host::UpdateTeamRequest,
            crate::dto::host::UpdateChallengeRequest,
            crate::dto::host::ReorderChallengesRequest,
            crate::dto::host::OutcomeRequest,
            crate::dto::host::AssignTeamRequest,
            crate::dto::host::SetLeaderRequest,
            crate::dto::host::RenameParticipantRequest,
            crate::dto::host::JoinLinkResponse,
            crate::dto::player::JoinGameRequest,
            crate::dto::player::JoinGameResponse,
            crate::dto::player::ChangeNicknameRequest,
            crate::dto::player::LineupToggleRequest,
            crate::dto::player::CastVoteRequest,
            crate::dto::player::CastVoteResponse,
            crate::dto::public::TeamTallyDto,
            crate::dto::public::VoteTallyDto,
            crate::dto::public::TeamScoreDto,
            crate::dto::public::ScoreboardDto,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::GameSnapshotEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Unauthenticated read-only queries"),
        (name = "player", description = "Player device operations"),
        (name = "host", description = "Host display management operations"),
    )
)]
pub struct ApiDoc;
