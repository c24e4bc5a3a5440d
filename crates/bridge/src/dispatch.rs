// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command dispatcher: maps one inbound JSON frame to one outbound envelope.
//!
//! Recognized actions forward 1:1 to a controller operation; the operation's
//! result map is merged into the `response` envelope. `start_monitoring` and
//! `stop_monitoring` are handled locally against the registry's poller token.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ControlError;
use crate::monitor::spawn_status_poller;
use crate::state::{now_rfc3339, AppState};

#[derive(Debug, Default, Deserialize)]
struct AddLinksParams {
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    package_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LinkIdParams {
    #[serde(default)]
    link_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
struct SelectionParams {
    #[serde(default)]
    link_ids: Option<Vec<i64>>,
    #[serde(default)]
    package_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
struct MonitorParams {
    #[serde(default)]
    interval: Option<f64>,
}

/// Every action the channel understands. Unknown names never reach this
/// enum; they are echoed back in an error envelope with the raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Connect,
    Disconnect,
    AddLinks,
    GetDownloads,
    GetLinkgrabber,
    Start,
    Pause,
    Stop,
    Remove,
    MoveToDownloads,
    CleanupLinkgrabber,
    Status,
    StartMonitoring,
    StopMonitoring,
}

impl Action {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "add_links" => Self::AddLinks,
            "get_downloads" => Self::GetDownloads,
            "get_linkgrabber" => Self::GetLinkgrabber,
            "start" => Self::Start,
            "pause" => Self::Pause,
            "stop" => Self::Stop,
            "remove" => Self::Remove,
            "move_to_downloads" => Self::MoveToDownloads,
            "cleanup_linkgrabber" => Self::CleanupLinkgrabber,
            "status" => Self::Status,
            "start_monitoring" => Self::StartMonitoring,
            "stop_monitoring" => Self::StopMonitoring,
            _ => return None,
        })
    }
}

/// Resolve one raw text frame into the envelope to send back.
pub async fn dispatch_frame(state: &Arc<AppState>, text: &str) -> Value {
    let frame: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return plain_error("Invalid JSON format"),
    };

    let name = match frame.get("action").and_then(|v| v.as_str()) {
        Some(a) => a.to_owned(),
        None => return plain_error("No action specified"),
    };

    let Some(action) = Action::parse(&name) else {
        return json!({
            "type": "error",
            "action": name,
            "timestamp": now_rfc3339(),
            "error": format!("Unknown action: {name}"),
        });
    };

    match action {
        Action::Connect => respond(&name, state.controller.connect().await),
        Action::Disconnect => respond(&name, state.controller.disconnect().await),
        Action::AddLinks => match params::<AddLinksParams>(&frame) {
            Ok(p) => respond(&name, state.controller.add_links(p.links, p.package_name).await),
            Err(msg) => plain_error(&msg),
        },
        Action::GetDownloads => respond(&name, state.controller.get_downloads().await),
        Action::GetLinkgrabber => respond(&name, state.controller.get_linkgrabber().await),
        Action::Start => match params::<LinkIdParams>(&frame) {
            Ok(p) => respond(&name, state.controller.start_downloads(p.link_ids).await),
            Err(msg) => plain_error(&msg),
        },
        Action::Pause => match params::<LinkIdParams>(&frame) {
            Ok(p) => respond(&name, state.controller.pause_downloads(p.link_ids).await),
            Err(msg) => plain_error(&msg),
        },
        Action::Stop => respond(&name, state.controller.stop_downloads().await),
        Action::Remove => match params::<SelectionParams>(&frame) {
            Ok(p) => respond(
                &name,
                state
                    .controller
                    .remove_links(p.link_ids.unwrap_or_default(), p.package_ids.unwrap_or_default())
                    .await,
            ),
            Err(msg) => plain_error(&msg),
        },
        Action::MoveToDownloads => match params::<SelectionParams>(&frame) {
            Ok(p) => respond(
                &name,
                state
                    .controller
                    .move_to_downloads(
                        p.link_ids.unwrap_or_default(),
                        p.package_ids.unwrap_or_default(),
                    )
                    .await,
            ),
            Err(msg) => plain_error(&msg),
        },
        Action::CleanupLinkgrabber => match params::<SelectionParams>(&frame) {
            Ok(p) => respond(
                &name,
                state
                    .controller
                    .cleanup_linkgrabber(
                        p.link_ids.unwrap_or_default(),
                        p.package_ids.unwrap_or_default(),
                    )
                    .await,
            ),
            Err(msg) => plain_error(&msg),
        },
        Action::Status => respond(&name, state.controller.download_status().await),
        Action::StartMonitoring => match params::<MonitorParams>(&frame) {
            Ok(p) => start_monitoring(state, p.interval).await,
            Err(msg) => plain_error(&msg),
        },
        Action::StopMonitoring => {
            state.registry.cancel_monitor().await;
            respond(&name, Ok(json!({ "success": true, "message": "Monitoring stopped" })))
        }
    }
}

/// Swap in a fresh poller; always reports success without waiting for the
/// first broadcast.
async fn start_monitoring(state: &Arc<AppState>, interval: Option<f64>) -> Value {
    let mut interval = interval.unwrap_or(state.config.monitor_interval_secs);
    if !(interval.is_finite() && interval > 0.0) {
        interval = state.config.monitor_interval_secs;
    }
    let token = state.registry.install_monitor().await;
    spawn_status_poller(Arc::clone(state), Duration::from_secs_f64(interval), token);
    respond(
        "start_monitoring",
        Ok(json!({
            "success": true,
            "message": format!("Monitoring started with {interval}s interval"),
        })),
    )
}

/// Build a `response` envelope, merging the operation's result map.
/// Controller failures stay inside the envelope as `success: false`.
fn respond(action: &str, result: Result<Value, ControlError>) -> Value {
    let mut envelope = Map::new();
    envelope.insert("type".to_owned(), json!("response"));
    envelope.insert("action".to_owned(), json!(action));
    envelope.insert("timestamp".to_owned(), json!(now_rfc3339()));
    match result {
        Ok(Value::Object(fields)) => {
            for (key, value) in fields {
                envelope.insert(key, value);
            }
        }
        Ok(other) => {
            envelope.insert("result".to_owned(), other);
        }
        Err(e) => {
            envelope.insert("success".to_owned(), json!(false));
            envelope.insert("error".to_owned(), json!(e.to_string()));
        }
    }
    Value::Object(envelope)
}

/// Frame-level protocol errors carry only type and message.
fn plain_error(message: &str) -> Value {
    json!({ "type": "error", "error": message })
}

fn params<T: serde::de::DeserializeOwned>(frame: &Value) -> Result<T, String> {
    serde_json::from_value(frame.clone()).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
