//! Connection upgrade and the per-socket read/write loop. Grounded on the
//! split-sender/split-receiver, two-spawned-tasks-raced-with-`select!`
//! shape used throughout the rest of this codebase's WebSocket layer —
//! the quiz engine never touches an `axum::extract::ws::WebSocket`
//! directly, only this module does.

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::auth::extract_bearer_token;
use crate::connection::RegistryError;
use crate::protocol::{self, ConnectionId, ErrorCode, ProtocolError, ServerMessage, UserId};

use super::dispatch::handle_client_message;
use super::Gateway;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(gateway): State<Arc<Gateway>>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
) -> Response {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let Some(token) = extract_bearer_token(auth_header, query.token.as_deref()) else {
        return (StatusCode::UNAUTHORIZED, "missing session token").into_response();
    };

    let user_id = match gateway.verifier.verify(&token).await {
        Ok((user_id, _expires_at)) => user_id,
        Err(_) => return (StatusCode::UNAUTHORIZED, "invalid session token").into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, gateway, user_id))
}

async fn handle_socket(socket: WebSocket, gateway: Arc<Gateway>, user_id: UserId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let attached = match gateway.connections.attach(user_id) {
        Ok(attached) => attached,
        Err(RegistryError::ConnectionLimit) => {
            if let Ok(text) = protocol::encode(&ServerMessage::error(ErrorCode::ConnectionLimit)) {
                let _ = ws_sender.send(Message::Text(text.into())).await;
            }
            let _ = ws_sender.close().await;
            return;
        }
    };
    let connection_id = attached.id;
    let mut outbound = attached.receiver;
    let mut shutdown = attached.shutdown;

    tracing::info!(%connection_id, user_id, "connection attached");
    let _ = gateway
        .connections
        .send(connection_id, ServerMessage::Connected { user_id });

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // The registry entry backing this connection is gone;
                        // nothing more will ever arrive on either channel.
                        break;
                    }
                    if !*shutdown.borrow() {
                        continue;
                    }
                    let _ = ws_sender
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::AWAY,
                            reason: "server shutting down".into(),
                        })))
                        .await;
                    break;
                }
                message = outbound.recv() => {
                    match message {
                        Some(message) => match protocol::encode(&message) {
                            Ok(text) => {
                                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => tracing::error!(%connection_id, error = %err, "failed to encode outbound frame"),
                        },
                        None => break,
                    }
                }
            }
        }
        let _ = ws_sender.close().await;
    });

    let gateway_recv = gateway.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(frame) = ws_receiver.next().await {
            let Ok(message) = frame else { break };
            match message {
                Message::Text(text) => {
                    handle_inbound_text(&gateway_recv, connection_id, user_id, &text).await;
                }
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = receive_task => {}
    }

    cleanup(&gateway, connection_id, user_id).await;
}

async fn handle_inbound_text(gateway: &Arc<Gateway>, connection_id: ConnectionId, user_id: UserId, text: &str) {
    if !gateway.connections.check_rate_limit(connection_id) {
        gateway.metrics.rate_limited();
        let _ = gateway
            .connections
            .send(connection_id, ServerMessage::error(ErrorCode::RateLimited));
        return;
    }

    match protocol::decode(text) {
        Ok(client_message) => {
            handle_client_message(gateway, connection_id, user_id, client_message).await;
        }
        Err(err) => {
            gateway.metrics.error_emitted();
            let code = match err {
                ProtocolError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
                ProtocolError::BadFrame(_) => ErrorCode::BadFrame,
                ProtocolError::BadPayload(_) => ErrorCode::BadPayload,
            };
            let _ = gateway.connections.send(connection_id, ServerMessage::error(code));
        }
    }
}

/// Tears down everything the connection touched: its registry entry and,
/// if it was mid-room, its room-engine membership (the leave-side
/// counterpart to `join_participant`).
async fn cleanup(gateway: &Arc<Gateway>, connection_id: ConnectionId, user_id: UserId) {
    if let Some(room_id) = gateway.connections.detach(connection_id).await {
        if let Some(handle) = gateway.rooms.get(&room_id) {
            handle.leave(user_id).await;
        }
    }
    tracing::info!(%connection_id, user_id, "connection detached");
}
