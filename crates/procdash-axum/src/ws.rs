//! WebSocket upgrade handler and request dispatch.
//!
//! `GET /ws` upgrades to the dashboard channel: JSON `{event, payload}`
//! envelopes in both directions. Each connection gets a session id, an
//! egress task draining the session's outbound channel into the socket, and
//! an ingest loop parsing client requests. Per-request failures come back
//! to the requester as `unicast/process/error`; nothing here can take the
//! server down.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use procdash_core::error::SupervisorError;
use procdash_core::ports::EventSink;
use procdash_core::protocol::{ClientRequest, Delivery, ServerEvent, SessionId};

use crate::state::AppState;

/// `GET /ws` - WebSocket upgrade endpoint for the dashboard channel.
pub async fn process_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (session_id, mut outbound_rx) = state.sessions.register().await;
    info!(session = %session_id, "New client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Egress: outbound channel -> JSON text frames.
    let mut egress = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_tx.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to serialize event"),
            }
        }
    });

    // Ingest: text frames -> parsed requests -> supervisor.
    let ingest_state = Arc::clone(&state);
    let mut ingest = tokio::spawn(async move {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => dispatch(&ingest_state, session_id, &text).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {} // binary/ping/pong: nothing to do
                Err(e) => {
                    debug!(session = %session_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    // Either side finishing means the connection is done.
    tokio::select! {
        _ = &mut ingest => egress.abort(),
        _ = &mut egress => ingest.abort(),
    }

    state.sessions.unregister(session_id).await;
    info!(session = %session_id, "Client disconnected");
}

/// Parse and route one inbound client message.
///
/// Malformed messages are logged and dropped; there is no session to blame
/// a process error on until the envelope parses.
async fn dispatch(state: &AppState, session: SessionId, raw: &str) {
    let request = match serde_json::from_str::<ClientRequest>(raw) {
        Ok(request) => request,
        Err(e) => {
            warn!(session = %session, error = %e, "Ignoring malformed client message");
            return;
        }
    };

    match request {
        ClientRequest::Start { process_name } => {
            if let Err(err) = state.supervisor.start(&process_name).await {
                report(state, session, &err).await;
            }
        }
        ClientRequest::Stop { process_name } => {
            if let Err(err) = state.supervisor.stop(&process_name).await {
                report(state, session, &err).await;
            }
        }
        ClientRequest::Join { process_name } => {
            // Subscribe first, then snapshot: a line logged between the two
            // is delivered as a multicast rather than silently missed.
            state.sessions.join(session, &process_name).await;
            match state.supervisor.join_info(&process_name).await {
                Ok(info) => {
                    state
                        .sessions
                        .deliver(
                            Delivery::Unicast(session),
                            ServerEvent::JoinResponse {
                                process_name,
                                running: info.running,
                                log: info.log,
                                path: info.path,
                                args: info.args,
                            },
                        )
                        .await;
                }
                Err(err) => {
                    // Unknown name: undo the speculative join.
                    state.sessions.leave(session, &process_name).await;
                    report(state, session, &err).await;
                }
            }
        }
    }
}

/// Surface a per-request failure to the requester only.
async fn report(state: &AppState, session: SessionId, err: &SupervisorError) {
    state
        .sessions
        .deliver(
            Delivery::Unicast(session),
            ServerEvent::Error {
                process_name: err.process_name().to_string(),
                message: err.to_string(),
            },
        )
        .await;
}
