// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background status poller: periodically broadcasts monitoring updates to
//! all registered connections.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::state::{now_rfc3339, AppState};

/// Spawn the poller loop. It runs until cancelled, until no connections
/// remain, or until the controller disconnects — whichever comes first.
///
/// Fetch failures degrade a single update (status carries `success: false`,
/// downloads go empty) instead of terminating the loop.
pub fn spawn_status_poller(
    state: Arc<AppState>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(interval_secs = interval.as_secs_f64(), "status poller started");
        loop {
            if state.registry.connection_count().await == 0 {
                break;
            }
            if !state.controller.is_connected().await {
                break;
            }

            let status = match state.controller.download_status().await {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(err = %e, "status fetch failed");
                    json!({ "success": false, "error": e.to_string() })
                }
            };
            let downloads = match state.controller.get_downloads().await {
                Ok(value) => value.get("downloads").cloned().unwrap_or_else(|| json!([])),
                Err(e) => {
                    tracing::warn!(err = %e, "downloads fetch failed");
                    json!([])
                }
            };

            let update = json!({
                "type": "monitoring_update",
                "timestamp": now_rfc3339(),
                "status": status,
                "downloads": downloads,
            });

            // A superseded poller must go quiet before the replacement's
            // first broadcast, so the token is checked right before sending.
            if cancel.is_cancelled() {
                break;
            }
            state.registry.broadcast(&update.to_string()).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        tracing::debug!("status poller stopped");
    })
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
