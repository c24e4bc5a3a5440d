// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the bridge.

pub mod auth;
pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the axum `Router` with all bridge routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(http::health))
        // Settings file
        .route("/api/v1/config", get(http::get_config))
        .route(
            "/api/v1/config/credentials",
            post(http::update_credentials)
                .put(http::update_credentials)
                .delete(http::clear_credentials),
        )
        .route("/api/v1/config/status", get(http::connection_status))
        // Cloud account
        .route("/api/v1/cloud/connect", post(http::cloud_connect))
        .route("/api/v1/cloud/devices", get(http::cloud_devices))
        .route("/api/v1/cloud/verify", post(http::cloud_verify))
        // Local process lifecycle
        .route("/api/v1/service/status", get(http::service_status))
        .route("/api/v1/service/start", post(http::service_start))
        .route("/api/v1/service/stop", post(http::service_stop))
        .route("/api/v1/service/restart", post(http::service_restart))
        .route("/api/v1/logs", get(http::tail_logs))
        // WebSocket control channel
        .route("/ws", get(ws::ws_handler))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
