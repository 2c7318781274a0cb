//! `WebSocket` handler for real-time snapshot streaming.
//!
//! Clients connect to `GET /ws/sessions/{id}` and receive the session's
//! current snapshot, then a JSON-encoded [`Snapshot`] each time the actor
//! publishes one.
//!
//! The bus does not replay. A client that lags is resynchronized with a
//! fresh `GetState`. When the session's topic closes because the actor
//! was replaced, the handler waits for the supervisor's new handle,
//! resubscribes, and resynchronizes. When the session ends, the socket is
//! closed.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};
use lifegrid_core::actor::ActorHandle;
use lifegrid_types::Snapshot;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ObserverError;
use crate::handlers::parse_session_id;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming snapshots of one session.
///
/// # Route
///
/// `GET /ws/sessions/{id}`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let session = parse_session_id(&id_str)?;
    let handles = state.supervisor.watch(session).await?;
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, handles)))
}

async fn handle_ws(socket: WebSocket, handles: watch::Receiver<ActorHandle>) {
    let (sender, receiver) = socket.split();
    stream_session(sender, receiver, handles).await;
}

/// Stream one session's snapshots to a client until either side goes
/// away.
///
/// `sender` carries frames to the client and `receiver` yields frames
/// from it. `handles` is the supervisor's watch channel for the session;
/// a new value means the actor was replaced, and a closed channel means
/// the session ended, in which case a close frame is sent.
pub async fn stream_session<Tx, Rx, E>(
    mut sender: Tx,
    mut receiver: Rx,
    mut handles: watch::Receiver<ActorHandle>,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut handle = handles.borrow_and_update().clone();
    let session = handle.session();
    debug!(session = %session, "WebSocket client connected");

    let mut rx = handle.subscribe();
    let mut subscribed = true;
    if !send_current(&mut sender, &handle).await {
        return;
    }

    loop {
        tokio::select! {
            // Receive a snapshot published by the actor.
            result = rx.recv(), if subscribed => {
                match result {
                    Ok(snapshot) => {
                        if !send_snapshot(&mut sender, &snapshot).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, resynchronizing");
                        if !send_current(&mut sender, &handle).await {
                            return;
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!(session = %session, "snapshot stream closed, awaiting replacement actor");
                        subscribed = false;
                    }
                }
            }
            // The supervisor replaced the actor, or the session ended.
            changed = handles.changed() => {
                if changed.is_err() {
                    debug!(session = %session, "session ended, closing WebSocket");
                    let _ = sender.send(Message::Close(None)).await;
                    return;
                }
                handle = handles.borrow_and_update().clone();
                rx = handle.subscribe();
                subscribed = true;
                if !send_current(&mut sender, &handle).await {
                    return;
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Commands go through the REST API; ignore client frames.
                    }
                }
            }
        }
    }
}

/// Fetch and send the current snapshot. Returns `false` once the client
/// is gone. An unavailable actor is not fatal: the replacement's handle
/// arrives through the watch channel.
async fn send_current<Tx>(sender: &mut Tx, handle: &ActorHandle) -> bool
where
    Tx: Sink<Message> + Unpin,
{
    match handle.get_state().await {
        Ok(snapshot) => send_snapshot(sender, &snapshot).await,
        Err(e) => {
            debug!(error = %e, "could not resynchronize, waiting for next handle");
            true
        }
    }
}

/// Send one snapshot as a text frame. Returns `false` once the client is
/// gone.
async fn send_snapshot<Tx>(sender: &mut Tx, snapshot: &Snapshot) -> bool
where
    Tx: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(snapshot) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize snapshot: {e}");
            return true;
        }
    };
    sender.send(Message::Text(json.into())).await.is_ok()
}
