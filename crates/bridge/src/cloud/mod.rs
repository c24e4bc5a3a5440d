// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud session client: capability traits and the remote data model.
//!
//! The controller only talks to the vendor cloud through [`CloudConnector`]
//! and [`DeviceLink`], so tests can substitute fakes without any network.

pub mod myjd;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Status string the vendor reports for an actively transferring link.
pub const STATUS_DOWNLOADING: &str = "Downloading";

/// Account credentials plus the preferred device name from the settings file.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub device_name: Option<String>,
}

/// A remote endpoint reachable through an authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub device_type: String,
    #[serde(default = "offline")]
    pub status: String,
}

/// One entry in the download queue. Read-only snapshot; never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadItem {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown")]
    pub status: String,
    #[serde(default)]
    pub bytes_total: i64,
    #[serde(default)]
    pub bytes_loaded: i64,
    #[serde(default)]
    pub speed: i64,
    #[serde(default)]
    pub eta: i64,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub uuid: i64,
    #[serde(default)]
    pub url: String,
}

/// A candidate link still in the linkgrabber staging queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkGrabberItem {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub bytes_total: i64,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub uuid: i64,
    #[serde(default, rename = "packageUUID")]
    pub package_uuid: i64,
}

fn unknown() -> String {
    "Unknown".to_owned()
}

fn offline() -> String {
    "OFFLINE".to_owned()
}

fn enabled_default() -> bool {
    true
}

/// An authenticated link to the cloud with one selected device.
pub struct CloudSession {
    pub device: DeviceInfo,
    pub link: Box<dyn DeviceLink>,
}

/// Session establishment and account-level queries.
#[async_trait]
pub trait CloudConnector: Send + Sync {
    /// Authenticate and open a session with one selected device.
    async fn connect(&self, creds: &Credentials) -> Result<CloudSession, ControlError>;

    /// Authenticate and list the account's devices without selecting one.
    async fn list_devices(&self, creds: &Credentials) -> Result<Vec<DeviceInfo>, ControlError>;
}

/// Per-device sub-resources: linkgrabber, download queue, download controller.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    async fn add_links(&self, urls: &[String], package_name: &str) -> Result<(), ControlError>;

    async fn query_downloads(&self) -> Result<Vec<DownloadItem>, ControlError>;
    async fn query_download_packages(&self) -> Result<serde_json::Value, ControlError>;

    async fn query_grabber(&self) -> Result<Vec<LinkGrabberItem>, ControlError>;
    async fn query_grabber_packages(&self) -> Result<serde_json::Value, ControlError>;

    /// Resume specific links in the download queue.
    async fn resume_links(&self, link_ids: &[i64]) -> Result<(), ControlError>;
    /// Enable or disable specific links in the download queue.
    async fn set_enabled(&self, enabled: bool, link_ids: &[i64]) -> Result<(), ControlError>;

    /// Whole-queue download controller operations.
    async fn start_downloads(&self) -> Result<(), ControlError>;
    async fn pause_downloads(&self) -> Result<(), ControlError>;
    async fn stop_downloads(&self) -> Result<(), ControlError>;

    async fn remove_download_links(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError>;
    async fn remove_grabber_links(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError>;
    async fn move_to_downloads(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError>;

    async fn current_state(&self) -> Result<String, ControlError>;

    /// Tear down the cloud session. Callers treat failures as non-fatal.
    async fn disconnect(&self) -> Result<(), ControlError>;
}

/// Select a device: case-insensitive name match when a preferred name is
/// given, otherwise (or when no name matches) the first device in the list.
pub fn select_device(devices: &[DeviceInfo], preferred: Option<&str>) -> Option<DeviceInfo> {
    if let Some(name) = preferred {
        if let Some(found) = devices.iter().find(|d| d.name.eq_ignore_ascii_case(name)) {
            return Some(found.clone());
        }
    }
    devices.first().cloned()
}

#[cfg(test)]
#[path = "../cloud_tests.rs"]
mod tests;
