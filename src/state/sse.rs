use tokio::sync::{Mutex, broadcast};

use crate::dto::sse::ServerEvent;

/// SSE-specific sub-state carved out from [`super::AppState`].
pub struct SseState {
    player: SseHub,
    host: HostSseState,
}

impl SseState {
    /// Build the SSE sub-tree with per-stream channel capacities.
    pub fn new(player_capacity: usize, host_capacity: usize) -> Self {
        Self {
            player: SseHub::new(player_capacity),
            host: HostSseState::new(host_capacity),
        }
    }

    /// Access the player SSE hub used to fan out broadcast events.
    pub fn player(&self) -> &SseHub {
        &self.player
    }

    /// Access the host SSE state bundle containing both hub and token.
    pub fn host(&self) -> &HostSseState {
        &self.host
    }
}

/// State bundle holding the host SSE hub and its coordinating token.
pub struct HostSseState {
    hub: SseHub,
    token: Mutex<Option<String>>,
}

impl HostSseState {
    /// Create the host SSE manager backed by a broadcast channel and token lock.
    fn new(capacity: usize) -> Self {
        Self {
            hub: SseHub::new(capacity),
            token: Mutex::new(None),
        }
    }

    /// Borrow the broadcast hub used for host-only events.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Borrow the token mutex that coordinates the single host connection.
    pub fn token(&self) -> &Mutex<Option<String>> {
        &self.token
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
