//! WebSocket transport for live notifications.
//!
//! A connecting client is registered in the [`ConnectionManager`]; the socket
//! task drains the registered receiver and writes each payload as a JSON text
//! frame.  Disconnect (or a replaced registration) closes the receiver and
//! the task unregisters on the way out.
//!
//! [`ConnectionManager`]: ideabridge_core::connections::ConnectionManager

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    /// Authenticated user id, as established by the external identity
    /// service.  Browsers cannot set headers on WebSocket upgrades, so it
    /// travels as a query parameter.
    pub user_id: Uuid,
}

pub async fn notifications_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.user_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let mut rx = state.connections.register(user_id).await;
    info!(user = %user_id, "notification socket opened");

    // Set when a newer connection replaced this one; unregistering then would
    // tear down the replacement's channel.
    let mut replaced = false;

    loop {
        tokio::select! {
            payload = rx.recv() => {
                let Some(payload) = payload else {
                    debug!(user = %user_id, "push channel replaced by newer connection");
                    replaced = true;
                    break;
                };

                let text = match serde_json::to_string(&payload) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(user = %user_id, error = %e, "failed to encode push payload");
                        continue;
                    }
                };

                if socket.send(Message::Text(text)).await.is_err() {
                    debug!(user = %user_id, "socket send failed, closing");
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Clients only send keepalives; ignore the content.
                    Some(Ok(_)) => continue,
                    _ => break,
                }
            }
        }
    }

    if !replaced {
        state.connections.unregister(user_id).await;
    }
    info!(user = %user_id, "notification socket closed");
}
