//! WebSocket endpoint pushing change events.
//!
//! Each socket owns one [`Subscription`](crate::broadcast::Subscription).
//! Inbound messages are read only to notice a close.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

use crate::broadcast::Broadcaster;

use super::ServerState;

/// `GET /ws`
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    let broadcaster = state.broadcaster.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Broadcaster) {
    let mut subscription = broadcaster.subscribe();
    let id = subscription.id();
    crate::log_event!("ws", "connected", "{id}");

    let (mut outbound, mut inbound) = socket.split();

    loop {
        tokio::select! {
            payload = subscription.recv() => match payload {
                Some(payload) => {
                    if let Err(e) = outbound.send(Message::Text(payload.to_string().into())).await {
                        crate::debug_event!("ws", "send failed", "{id}: {e}");
                        break;
                    }
                }
                None => {
                    // Dropped by the broadcaster (slow client or shutdown)
                    let _ = outbound.send(Message::Close(None)).await;
                    break;
                }
            },

            message = inbound.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    crate::debug_event!("ws", "receive failed", "{id}: {e}");
                    break;
                }
            },
        }
    }

    drop(subscription);
    crate::log_event!("ws", "disconnected", "{id}");
}
