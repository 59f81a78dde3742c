// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation-id → real-time channel registry.
//!
//! A browser opens its WebSocket with a self-generated `clientId` before it
//! has a token. Synchronous handlers that later fail for the same browser
//! look the channel up by that id and push a best-effort error onto it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Outbound half of one real-time connection.
///
/// Text queued with [`send`](Self::send) is written to the socket by the
/// connection's own loop. The channel counts as closed once that loop has
/// gone away or [`close`](Self::close) was called.
#[derive(Debug, Clone)]
pub struct ClientChannel {
    conn: u64,
    tx: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl ClientChannel {
    /// Create a channel and the receiver its connection loop drains.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed);
        (Self { conn, tx, cancel: CancellationToken::new() }, rx)
    }

    /// Serial number distinguishing this connection from any other.
    pub fn connection(&self) -> u64 {
        self.conn
    }

    pub fn is_open(&self) -> bool {
        !self.cancel.is_cancelled() && !self.tx.is_closed()
    }

    /// Queue `text` for delivery. Returns `false` (and drops the text) when
    /// the channel is no longer open.
    pub fn send(&self, text: String) -> bool {
        if !self.is_open() {
            return false;
        }
        self.tx.send(text).is_ok()
    }

    /// Serialize `value` and queue it.
    pub fn send_json<T: Serialize>(&self, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(text) => self.send(text),
            Err(e) => {
                tracing::warn!(conn = self.conn, err = %e, "failed to encode outbound message");
                false
            }
        }
    }

    /// Ask the owning connection loop to shut the socket.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }

    fn same_connection(&self, other: &ClientChannel) -> bool {
        self.conn == other.conn
    }
}

/// Out-of-band error pushed to a browser's channel.
#[derive(Debug, Clone, Serialize)]
struct PushedError<'a> {
    success: bool,
    error: &'a str,
}

/// Shared map of live real-time channels keyed by correlation id.
///
/// The lock is synchronous and never held across an await point.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    channels: RwLock<HashMap<String, ClientChannel>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `id` to `channel`.
    ///
    /// If `id` already maps to a different connection, that connection is
    /// closed and returned.
    pub fn register(&self, id: &str, channel: ClientChannel) -> Option<ClientChannel> {
        let previous = self.channels.write().insert(id.to_owned(), channel.clone());
        match previous {
            Some(old) if !old.same_connection(&channel) => {
                old.close();
                tracing::info!(
                    client_id = id,
                    old_conn = old.connection(),
                    new_conn = channel.connection(),
                    "correlation id reused, closed superseded channel"
                );
                Some(old)
            }
            _ => None,
        }
    }

    pub fn lookup(&self, id: &str) -> Option<ClientChannel> {
        self.channels.read().get(id).cloned()
    }

    /// Remove the mapping for `id`. Removing an absent id is a no-op.
    pub fn unregister(&self, id: &str) {
        self.channels.write().remove(id);
    }

    /// Remove `id` only while it still maps to `channel`.
    ///
    /// Connection loops call this on exit so a superseded connection cannot
    /// evict the channel that replaced it.
    pub fn release(&self, id: &str, channel: &ClientChannel) -> bool {
        let mut channels = self.channels.write();
        match channels.get(id) {
            Some(current) if current.same_connection(channel) => {
                channels.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Best-effort `{success:false, error}` push to the channel under `id`.
    ///
    /// Returns whether the message was queued. An absent or closed channel is
    /// not an error.
    pub fn push_error(&self, id: &str, message: &str) -> bool {
        let Some(channel) = self.lookup(id) else {
            tracing::debug!(client_id = id, "no channel registered, push skipped");
            return false;
        };
        let delivered = channel.send_json(&PushedError { success: false, error: message });
        if !delivered {
            tracing::debug!(client_id = id, "channel closed, push dropped");
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
