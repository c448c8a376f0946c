/// OpenAPI documentation generation.
pub mod documentation;
/// Persistence helpers shared across services.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Host-facing game management operations.
pub mod host_service;
/// Player-facing join, lineup, and voting operations.
pub mod player_service;
/// Read-only game information for unauthenticated clients.
pub mod public_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervision and degraded mode handling.
pub mod storage_supervisor;
#[cfg(test)]
pub(crate) mod testing;
