// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST handlers: settings, cloud account, and local process lifecycle.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ControlError};
use crate::state::{now_rfc3339, AppState};

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub email: Option<String>,
    pub device_name: String,
    pub auto_connect: bool,
    pub server_host: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsUpdate {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    fn success(message: impl Into<String>) -> Json<Self> {
        Json(Self { status: "success".to_owned(), message: message.into() })
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub expected_device: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_log_lines")]
    pub lines: usize,
}

fn default_log_lines() -> usize {
    100
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_owned(),
        service: "jdbridge".to_owned(),
        timestamp: now_rfc3339(),
    })
}

/// `GET /api/v1/config` — current settings (password never returned).
pub async fn get_config(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = s.settings.read();
    Json(ConfigResponse {
        email: settings.email,
        device_name: settings.devicename,
        auto_connect: settings.autoconnect_enabled,
        server_host: settings.serverhost,
    })
}

/// `POST|PUT /api/v1/config/credentials`
pub async fn update_credentials(
    State(s): State<Arc<AppState>>,
    Json(req): Json<CredentialsUpdate>,
) -> impl IntoResponse {
    match s.settings.update_credentials(&req.email, &req.password, req.device_name.as_deref()) {
        Ok(()) => StatusMessage::success("Credentials updated successfully").into_response(),
        Err(e) => ApiError::BadRequest.to_http_response(e.to_string()).into_response(),
    }
}

/// `DELETE /api/v1/config/credentials`
pub async fn clear_credentials(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match s.settings.clear_credentials() {
        Ok(()) => StatusMessage::success("Credentials cleared successfully").into_response(),
        Err(e) => ApiError::Internal.to_http_response(e.to_string()).into_response(),
    }
}

/// `GET /api/v1/config/status` — credential + session state at a glance.
pub async fn connection_status(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = s.settings.read();
    let configured = s.settings.credentials().is_some();
    let device = s.controller.device_info().await;
    Json(serde_json::json!({
        "configured": configured,
        "email": settings.email,
        "device_name": settings.devicename,
        "connected": s.controller.is_connected().await,
        "device": device,
    }))
}

/// `POST /api/v1/cloud/connect`
pub async fn cloud_connect(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match s.controller.connect().await {
        Ok(value) => Json(value).into_response(),
        Err(e) => ApiError::from(&e).to_http_response(e.to_string()).into_response(),
    }
}

/// `GET /api/v1/cloud/devices`
pub async fn cloud_devices(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(creds) = s.settings.credentials() else {
        return ApiError::BadRequest
            .to_http_response(ControlError::NoCredentials.to_string())
            .into_response();
    };
    match s.connector.list_devices(&creds).await {
        Ok(devices) => Json(serde_json::json!({
            "success": true,
            "device_count": devices.len(),
            "devices": devices,
        }))
        .into_response(),
        Err(e) => ApiError::from(&e).to_http_response(e.to_string()).into_response(),
    }
}

/// `POST /api/v1/cloud/verify` — list devices and check the expected one
/// (request body override, else the configured device name) is present.
pub async fn cloud_verify(
    State(s): State<Arc<AppState>>,
    body: Option<Json<VerifyRequest>>,
) -> impl IntoResponse {
    let Some(creds) = s.settings.credentials() else {
        return ApiError::BadRequest
            .to_http_response(ControlError::NoCredentials.to_string())
            .into_response();
    };
    let expected = body
        .and_then(|Json(req)| req.expected_device)
        .or_else(|| creds.device_name.clone());

    let devices = match s.connector.list_devices(&creds).await {
        Ok(devices) => devices,
        Err(e) => return ApiError::from(&e).to_http_response(e.to_string()).into_response(),
    };

    let mut found = false;
    let mut message = format!("Found {} device(s)", devices.len());
    if let Some(name) = &expected {
        found = devices.iter().any(|d| d.name.eq_ignore_ascii_case(name));
        message = if found {
            format!("Device '{name}' is connected")
        } else {
            let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
            format!("Device '{name}' not found. Available: {}", names.join(", "))
        };
    }

    Json(serde_json::json!({
        "connected": true,
        "message": message,
        "device_count": devices.len(),
        "devices": devices,
        "found_expected_device": found,
    }))
    .into_response()
}

/// `GET /api/v1/service/status`
pub async fn service_status(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.service.status().await)
}

/// `POST /api/v1/service/start`
pub async fn service_start(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match s.service.start().await {
        Ok(msg) => StatusMessage::success(msg).into_response(),
        Err(e) => ApiError::ServiceError.to_http_response(e.to_string()).into_response(),
    }
}

/// `POST /api/v1/service/stop`
pub async fn service_stop(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match s.service.stop().await {
        Ok(msg) => StatusMessage::success(msg).into_response(),
        Err(e) => ApiError::ServiceError.to_http_response(e.to_string()).into_response(),
    }
}

/// `POST /api/v1/service/restart`
pub async fn service_restart(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match s.service.restart().await {
        Ok(msg) => StatusMessage::success(msg).into_response(),
        Err(e) => ApiError::ServiceError.to_http_response(e.to_string()).into_response(),
    }
}

/// `GET /api/v1/logs?lines=N` — tail the newest JDownloader log file.
pub async fn tail_logs(
    State(s): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let dir = s.config.log_dir();
    let newest = std::fs::read_dir(&dir).ok().and_then(|entries| {
        entries
            .flatten()
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "log"))
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                Some((modified, e.path()))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, path)| path)
    });

    let Some(path) = newest else {
        return ApiError::NotFound
            .to_http_response(format!("no log files found in {}", dir.display()))
            .into_response();
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let all: Vec<&str> = contents.lines().collect();
            let start = all.len().saturating_sub(query.lines);
            Json(serde_json::json!({
                "success": true,
                "file": path.display().to_string(),
                "lines": all[start..],
            }))
            .into_response()
        }
        Err(e) => ApiError::Internal.to_http_response(e.to_string()).into_response(),
    }
}
