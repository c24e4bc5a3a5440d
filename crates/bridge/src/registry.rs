// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection registry: WebSocket membership and broadcast fan-out.
//!
//! Each connection registers an unbounded sender; its handler drains the
//! receiving end into the socket. Broadcast iterates a snapshot of the
//! membership so registration/unregistration can interleave freely, and
//! prunes any connection whose channel has closed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

pub type OutboundSender = mpsc::UnboundedSender<String>;

pub struct ConnectionRegistry {
    connections: RwLock<HashMap<u64, OutboundSender>>,
    next_id: AtomicU64,
    /// Token of the currently running status poller, if any.
    monitor: Mutex<Option<CancellationToken>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            monitor: Mutex::new(None),
        }
    }

    pub async fn register(&self, tx: OutboundSender) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.write().await.insert(id, tx);
        id
    }

    pub async fn unregister(&self, id: u64) {
        self.connections.write().await.remove(&id);
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send `message` to every registered connection; connections whose
    /// channel has closed are removed and do not abort delivery to the rest.
    /// Returns the number of successful deliveries.
    pub async fn broadcast(&self, message: &str) -> usize {
        let snapshot: Vec<(u64, OutboundSender)> = {
            let guard = self.connections.read().await;
            guard.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in snapshot {
            if tx.send(message.to_owned()).is_err() {
                dead.push(id);
            } else {
                delivered += 1;
            }
        }

        if !dead.is_empty() {
            let mut guard = self.connections.write().await;
            for id in &dead {
                guard.remove(id);
            }
            tracing::debug!(pruned = dead.len(), "removed dead connections during broadcast");
        }
        delivered
    }

    /// Install a fresh monitoring token, cancelling any previous one under
    /// the same critical section so two pollers never broadcast concurrently.
    pub async fn install_monitor(&self) -> CancellationToken {
        let mut guard = self.monitor.lock().await;
        if let Some(old) = guard.take() {
            old.cancel();
        }
        let token = CancellationToken::new();
        *guard = Some(token.clone());
        token
    }

    /// Cancel the running poller, if any. Returns whether one was running.
    pub async fn cancel_monitor(&self) -> bool {
        match self.monitor.lock().await.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
