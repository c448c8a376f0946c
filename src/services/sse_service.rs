//! SSE stream plumbing: subscription, forwarding, and host token handling.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the shared player SSE stream.
pub fn subscribe_player(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.player_sse().subscribe()
}

/// Subscribe to the host-only SSE stream, claiming the single host token.
pub async fn subscribe_host(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let token = claim_host_token(state).await?;
    let receiver = state.host_sse().subscribe();
    Ok((receiver, token))
}

/// Identifies the target SSE stream so we can perform stream-specific
/// bookkeeping when the connection is torn down.
#[derive(Clone)]
pub enum StreamKind {
    Player,
    /// Carries a clone of the shared application state so teardown logic can
    /// reset the host token after the spawned task completes. Cloning
    /// `SharedState` is cheap because it is just bumping the inner `Arc`.
    Host(SharedState),
}

/// Convert a broadcast receiver into an SSE response, optionally pushing
/// `initial` events (the snapshot) before the live feed, and cleaning up once
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Vec<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        for payload in initial {
            if tx.send(Ok(render_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(render_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Player => tracing::info!("Player SSE stream disconnected"),
            StreamKind::Host(state) => {
                // Own the necessary state inside the spawned task so we can
                // clean up even if the request context has already dropped.
                reset_host_token(state).await;
                tracing::info!("Host SSE stream disconnected")
            }
        }
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Render the per-connection handshake sent before any live event.
pub fn handshake_event(stream: &str, degraded: bool, token: Option<String>) -> Option<ServerEvent> {
    let payload = Handshake {
        stream: stream.to_owned(),
        message: format!("{stream} stream connected"),
        degraded,
        token,
    };
    match ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &payload) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    }
}

fn render_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Reserve the host token for a new stream, generating one when none exists
/// and failing if another connection already holds it.
async fn claim_host_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.host_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::Unauthorized(
            "Another host SSE stream is already active".into(),
        )),
    }
}

/// Check an incoming request token against the currently claimed host token.
pub async fn verify_host_token(state: &SharedState, candidate: &str) -> bool {
    let guard = state.host_token().lock().await;
    matches!(&*guard, Some(token) if token == candidate)
}

/// Clear any stored host token so the next host connection negotiates a
/// fresh credential.
async fn reset_host_token(state: SharedState) {
    let mut guard = state.host_token().lock().await;
    guard.take();
}
