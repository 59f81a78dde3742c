// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time channel: one WebSocket per browser tab, keyed by the
//! `clientId` the browser chose before logging in.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::dispatch::Reply;
use crate::error::DispatchError;
use crate::registry::ClientChannel;
use crate::state::{epoch_ms, AppState};

/// Query parameters for WebSocket upgrade.
#[derive(Debug, Clone, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
}

impl WsQuery {
    /// The correlation id the browser declared, if any.
    pub fn declared_client_id(self) -> Option<String> {
        self.client_id.filter(|id| !id.is_empty())
    }
}

/// Server-chosen id for a connection that declared none. The connection
/// serial keeps it unique, so it never supersedes another socket.
pub fn fallback_client_id(conn: u64) -> String {
    format!("{}-{conn}", epoch_ms())
}

/// `GET /?clientId=...`: WebSocket upgrade.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let declared = query.declared_client_id();
    ws.on_upgrade(move |socket| handle_connection(state, declared, socket))
}

/// Per-connection loop: replies and out-of-band pushes share one queue, and
/// inbound frames are handled strictly one at a time.
async fn handle_connection(state: Arc<AppState>, declared: Option<String>, socket: WebSocket) {
    let (channel, mut outbound) = ClientChannel::pair();
    let client_id = declared.unwrap_or_else(|| fallback_client_id(channel.connection()));
    state.registry.register(&client_id, channel.clone());
    tracing::info!(client_id, conn = channel.connection(), "client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = channel.closed() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            queued = outbound.recv() => {
                let Some(text) = queued else { break };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            msg = ws_rx.next() => {
                let reply = match msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(client_id, "received frame");
                        state.dispatcher.handle(text.as_str()).await
                    }
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => state.dispatcher.handle(text).await,
                        Err(_) => Reply::failure(DispatchError::InvalidFormat.to_string()),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(client_id, err = %e, "websocket read failed");
                        break;
                    }
                    _ => continue,
                };
                if !channel.send_json(&reply) {
                    tracing::debug!(client_id, "channel closed, reply dropped");
                }
            }
        }
    }

    state.registry.release(&client_id, &channel);
    tracing::info!(client_id, conn = channel.connection(), "client disconnected");
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
