// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors produced by the controller and cloud client.
///
/// Display strings double as the wire-level `error` field, so the
/// session-state variants keep the exact messages clients already match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Operation attempted without an active cloud session.
    NotConnected,
    /// Settings file has no usable email/password pair.
    NoCredentials,
    /// The cloud account has zero devices.
    NoDevicesFound,
    /// Session establishment failed.
    Auth(String),
    /// A data operation against the cloud failed.
    Transport(String),
    /// Malformed inbound frame.
    Protocol(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => f.write_str("Not connected"),
            Self::NoCredentials => f.write_str("No credentials configured"),
            Self::NoDevicesFound => f.write_str("No devices found"),
            Self::Auth(msg) | Self::Transport(msg) | Self::Protocol(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ControlError {}

impl From<reqwest::Error> for ControlError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Error codes for the REST façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    Unauthorized,
    BadRequest,
    NotFound,
    CloudError,
    ServiceError,
    Internal,
}

impl ApiError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::CloudError => 502,
            Self::ServiceError => 500,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::CloudError => "CLOUD_ERROR",
            Self::ServiceError => "SERVICE_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ControlError> for ApiError {
    fn from(e: &ControlError) -> Self {
        match e {
            ControlError::NotConnected
            | ControlError::NoCredentials
            | ControlError::Protocol(_) => Self::BadRequest,
            ControlError::NoDevicesFound
            | ControlError::Auth(_)
            | ControlError::Transport(_) => Self::CloudError,
        }
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
