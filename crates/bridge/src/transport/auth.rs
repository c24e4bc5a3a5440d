// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Validate the `X-API-Key` header against the configured shared secret.
pub fn validate_api_key(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let expected = match expected {
        Some(key) => key,
        None => return Ok(()),
    };

    let supplied =
        headers.get("x-api-key").and_then(|v| v.to_str().ok()).ok_or(ApiError::Unauthorized)?;

    if constant_time_eq(supplied, expected) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// Axum middleware that enforces the shared-secret header.
///
/// Exempt: `/api/v1/health` and the WebSocket upgrade (`/ws`).
pub async fn auth_layer(
    state: State<Arc<AppState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if path == "/api/v1/health" || path == "/ws" {
        return next.run(req).await;
    }

    if let Err(code) = validate_api_key(req.headers(), state.config.api_key.as_deref()) {
        let body = crate::error::ErrorResponse {
            error: code.to_error_body("invalid or missing API key"),
        };
        return (
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::UNAUTHORIZED),
            axum::Json(body),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
