// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket control channel.
//!
//! Each connection gets an outbound queue in the registry so monitoring
//! broadcasts and request responses share one writer. Responses are pushed
//! through the same queue, which keeps them ordered relative to broadcasts.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;
use tokio::sync::mpsc;

use crate::dispatch::dispatch_frame;
use crate::state::{now_rfc3339, AppState};

/// `GET /ws` upgrade endpoint.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let id = state.registry.register(tx).await;
    tracing::info!(connection = id, "websocket client connected");

    let welcome = json!({
        "type": "welcome",
        "message": "Connected to JDownloader WebSocket API",
        "timestamp": now_rfc3339(),
    });
    if socket.send(Message::Text(welcome.to_string().into())).await.is_err() {
        state.registry.unregister(id).await;
        return;
    }

    loop {
        tokio::select! {
            // Queued outbound traffic (responses + monitoring broadcasts).
            queued = rx.recv() => {
                let Some(text) = queued else { break };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let reply = dispatch_frame(&state, &text).await;
                        if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection = id, err = %e, "websocket read error");
                        break;
                    }
                }
            }
            _ = state.shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    state.registry.unregister(id).await;
    tracing::info!(connection = id, "websocket client disconnected");
}
