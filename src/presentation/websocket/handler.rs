//! WebSocket Connection Handler
//!
//! One task per socket reads frames and dispatches them; a spawned writer task
//! drains the connection's outbound queue onto the socket and sends pings.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::time::{interval, timeout, MissedTickBehavior};

use super::messages::decode_frame;
use super::session::SessionState;
use crate::application::services::{ConnectionHandle, DispatchOutcome, Dispatcher};
use crate::domain::ConnectionId;
use crate::infrastructure::metrics;
use crate::infrastructure::realtime::OutboundQueue;
use crate::startup::AppState;

/// How long a closing connection waits for its writer to send the close frame.
const WRITER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let max_message_size = state.settings.websocket.max_message_size;
    let max_frame_size = state.settings.websocket.max_frame_size;

    ws.max_message_size(max_message_size)
        .max_frame_size(max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    let mut session = SessionState::new(connection_id);
    let ws_settings = &state.settings.websocket;

    let outbound = Arc::new(OutboundQueue::new(
        ws_settings.outbound_queue_capacity,
        ws_settings.overflow_policy,
    ));
    let handle = ConnectionHandle::new(connection_id, Arc::clone(&outbound));

    metrics::connection_opened();
    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");

    // Split socket for concurrent read/write
    let (sender, mut receiver) = socket.split();

    let mut writer = tokio::spawn(write_loop(
        sender,
        Arc::clone(&outbound),
        ws_settings.heartbeat_interval(),
        connection_id,
    ));
    let mut writer_finished = false;

    let idle_timeout = ws_settings.idle_timeout();
    let mut liveness_check = interval(ws_settings.heartbeat_interval());
    liveness_check.set_missed_tick_behavior(MissedTickBehavior::Delay);
    liveness_check.tick().await; // Skip first immediate tick

    // Main message loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        session.touch();
                        handle_text(text.as_str(), &mut session, &handle, &state.dispatcher).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        session.touch();
                        tracing::debug!(
                            connection_id = %connection_id,
                            bytes = data.len(),
                            "Ignoring binary frame"
                        );
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Ping replies are sent automatically by axum
                        session.touch();
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed by peer");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            // Writer exits when the socket fails or the queue is closed by overflow
            _ = &mut writer => {
                writer_finished = true;
                tracing::debug!(connection_id = %connection_id, "Writer finished");
                break;
            }

            _ = liveness_check.tick() => {
                // The writer may be stuck on a peer that stopped reading
                if outbound.is_closed() {
                    tracing::info!(
                        connection_id = %connection_id,
                        profile_id = ?session.profile_id,
                        dropped = outbound.dropped(),
                        "Outbound queue closed, disconnecting"
                    );
                    break;
                }
                if !session.is_alive(idle_timeout) {
                    tracing::info!(
                        connection_id = %connection_id,
                        profile_id = ?session.profile_id,
                        "Heartbeat timeout, closing connection"
                    );
                    break;
                }
            }
        }
    }

    // Cleanup
    outbound.close();
    state.registry.unregister(&connection_id);
    if !writer_finished && timeout(WRITER_SHUTDOWN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
    metrics::connection_closed();

    tracing::debug!(
        connection_id = %connection_id,
        profile_id = ?session.profile_id,
        frames_received = session.frames_received,
        frames_rejected = session.frames_rejected,
        dropped = outbound.dropped(),
        "Connection finished"
    );
}

/// Decode and dispatch one text frame. Malformed frames are dropped.
async fn handle_text(
    text: &str,
    session: &mut SessionState,
    handle: &ConnectionHandle,
    dispatcher: &Dispatcher,
) {
    session.frames_received += 1;

    let event = match decode_frame(text) {
        Ok(event) => event,
        Err(e) => {
            session.frames_rejected += 1;
            metrics::record_malformed_frame(e.reason());
            tracing::debug!(
                connection_id = %session.connection_id,
                reason = e.reason(),
                error = %e,
                "Dropping malformed frame"
            );
            return;
        }
    };

    tracing::debug!(
        connection_id = %session.connection_id,
        event_type = %event.type_name(),
        uid = %event.uid(),
        "Event received"
    );

    if let DispatchOutcome::Registered(_) = dispatcher.dispatch(handle, &event).await {
        session.joined(event.uid(), event.room_id());
    }
}

/// Drain the outbound queue onto the socket and keep the peer alive with pings.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    outbound: Arc<OutboundQueue>,
    heartbeat_interval: Duration,
    connection_id: ConnectionId,
) {
    let mut ping = interval(heartbeat_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping.tick().await;

    loop {
        tokio::select! {
            frame = outbound.pop() => {
                let Some(frame) = frame else {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = sender.send(Message::Text(frame.to_string().into())).await {
                    tracing::debug!(connection_id = %connection_id, error = %e, "Write failed");
                    break;
                }
            }
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Anything still queued for this connection is undeliverable
    outbound.close();
}
