pub mod guest;
pub mod handlers;
pub mod host;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::HostMessage;
use crate::state::AppState;
use crate::types::Role;

/// Guest entry point: `/room/{code}`. Unknown codes are refused before the upgrade.
pub async fn guest_ws_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if !state.is_room(&code).await {
        tracing::info!("Guest asked for unknown room {}", code);
        return (StatusCode::NOT_FOUND, "Room not found").into_response();
    }

    tracing::info!("Guest connection request for room {}", code);
    ws.on_upgrade(move |socket| handle_socket(socket, Role::Guest, state))
}

/// Host control socket: `/host/ws`, behind basic auth
pub async fn host_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("Host control connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, Role::Host, state))
}

async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &HostMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle one connection: initial sync, then relay broadcasts and dispatch
/// incoming messages until either side goes away.
async fn handle_socket(socket: WebSocket, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe first so no update slips between the snapshot and the loop
    let mut broadcast_rx = state.broadcast.subscribe();

    tracing::info!("WebSocket connected with role: {:?}", role);

    if let Some(sync) = state.sync_message().await {
        if !send_message(&mut sender, &sync).await {
            tracing::error!("Failed to send initial sync");
            return;
        }
    }

    let mut dispatcher = handlers::spawn_dispatcher(role, state.clone());

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) => {
                        if !send_message(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Every sync is a full snapshot, so the latest one replaces what was missed
                        tracing::warn!("{:?} connection lagged by {} messages, resyncing", role, skipped);
                        if let Some(sync) = state.sync_message().await {
                            if !send_message(&mut sender, &sync).await {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            reply = dispatcher.replies.recv() => {
                let Some(response) = reply else { break };
                if !send_message(&mut sender, &response).await {
                    tracing::error!("Failed to send response");
                    break;
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text.as_str());
                        if dispatcher.frames.send(text.to_string()).is_err() {
                            tracing::error!("Dispatcher stopped");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}
