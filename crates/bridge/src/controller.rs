// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller: owns the cloud session and implements the remote-control
//! operations the dispatcher forwards to.
//!
//! Result maps carry the exact wire fields (`success`, `links_added`, ...)
//! that end up merged into response envelopes.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::cloud::{CloudConnector, DeviceInfo, DeviceLink, STATUS_DOWNLOADING};
use crate::error::ControlError;
use crate::settings::SettingsStore;

/// An established session with one selected device.
struct ActiveSession {
    device: DeviceInfo,
    link: Box<dyn DeviceLink>,
}

/// One controller instance per server; never process-global, so multiple
/// instances (e.g. under test) do not interfere.
pub struct Controller {
    connector: Arc<dyn CloudConnector>,
    settings: SettingsStore,
    session: RwLock<Option<Arc<ActiveSession>>>,
}

impl Controller {
    pub fn new(connector: Arc<dyn CloudConnector>, settings: SettingsStore) -> Self {
        Self { connector, settings, session: RwLock::new(None) }
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Device info for the active session, if any.
    pub async fn device_info(&self) -> Option<DeviceInfo> {
        self.session.read().await.as_ref().map(|s| s.device.clone())
    }

    async fn active(&self) -> Result<Arc<ActiveSession>, ControlError> {
        self.session.read().await.as_ref().map(Arc::clone).ok_or(ControlError::NotConnected)
    }

    /// Authenticate against the cloud and select a device.
    ///
    /// A failed connect leaves the previous session untouched; a successful
    /// one replaces it (last writer wins across concurrent connections).
    pub async fn connect(&self) -> Result<Value, ControlError> {
        let creds = self.settings.credentials().ok_or(ControlError::NoCredentials)?;
        let session = self.connector.connect(&creds).await?;
        let device = session.device.clone();
        *self.session.write().await =
            Some(Arc::new(ActiveSession { device: session.device, link: session.link }));
        tracing::info!(device = %device.name, "connected to cloud");
        Ok(json!({
            "success": true,
            "device_name": device.name,
            "device_id": device.id,
            "device_type": device.device_type,
            "status": "connected",
        }))
    }

    /// Idempotent: clears session state even if the cloud call fails.
    pub async fn disconnect(&self) -> Result<Value, ControlError> {
        let previous = self.session.write().await.take();
        if let Some(session) = previous {
            if let Err(e) = session.link.disconnect().await {
                tracing::debug!(err = %e, "cloud disconnect call failed");
            }
        }
        Ok(json!({ "success": true, "status": "disconnected" }))
    }

    pub async fn add_links(
        &self,
        links: Vec<String>,
        package_name: Option<String>,
    ) -> Result<Value, ControlError> {
        let session = self.active().await?;
        let resolved = package_name
            .clone()
            .unwrap_or_else(|| format!("Package_{}", chrono::Utc::now().timestamp()));
        session.link.add_links(&links, &resolved).await?;
        Ok(json!({
            "success": true,
            "links_added": links.len(),
            "package_name": package_name,
        }))
    }

    pub async fn get_downloads(&self) -> Result<Value, ControlError> {
        let session = self.active().await?;
        let items = session.link.query_downloads().await?;
        let packages = session.link.query_download_packages().await?;
        let total = items.len();
        Ok(json!({
            "success": true,
            "downloads": items,
            "packages": packages,
            "total_downloads": total,
        }))
    }

    pub async fn get_linkgrabber(&self) -> Result<Value, ControlError> {
        let session = self.active().await?;
        let items = session.link.query_grabber().await?;
        let packages = session.link.query_grabber_packages().await?;
        let total = items.len();
        Ok(json!({
            "success": true,
            "linkgrabber": items,
            "packages": packages,
            "total_links": total,
        }))
    }

    /// Empty/omitted ids resume the whole queue; explicit ids resume only those.
    pub async fn start_downloads(&self, link_ids: Option<Vec<i64>>) -> Result<Value, ControlError> {
        let session = self.active().await?;
        let message = match link_ids {
            Some(ids) if !ids.is_empty() => {
                session.link.resume_links(&ids).await?;
                format!("Started {} downloads", ids.len())
            }
            _ => {
                session.link.start_downloads().await?;
                "Started all downloads".to_owned()
            }
        };
        Ok(json!({ "success": true, "message": message }))
    }

    /// Explicit ids are paused by disabling them; no ids means global pause.
    pub async fn pause_downloads(&self, link_ids: Option<Vec<i64>>) -> Result<Value, ControlError> {
        let session = self.active().await?;
        let message = match link_ids {
            Some(ids) if !ids.is_empty() => {
                session.link.set_enabled(false, &ids).await?;
                format!("Paused {} downloads", ids.len())
            }
            _ => {
                session.link.pause_downloads().await?;
                "Paused all downloads".to_owned()
            }
        };
        Ok(json!({ "success": true, "message": message }))
    }

    pub async fn stop_downloads(&self) -> Result<Value, ControlError> {
        let session = self.active().await?;
        session.link.stop_downloads().await?;
        Ok(json!({ "success": true, "message": "Stopped all downloads" }))
    }

    pub async fn remove_links(
        &self,
        link_ids: Vec<i64>,
        package_ids: Vec<i64>,
    ) -> Result<Value, ControlError> {
        let session = self.active().await?;
        if !link_ids.is_empty() || !package_ids.is_empty() {
            session.link.remove_download_links(&link_ids, &package_ids).await?;
        }
        Ok(json!({
            "success": true,
            "removed_links": link_ids.len(),
            "removed_packages": package_ids.len(),
        }))
    }

    pub async fn move_to_downloads(
        &self,
        link_ids: Vec<i64>,
        package_ids: Vec<i64>,
    ) -> Result<Value, ControlError> {
        let session = self.active().await?;
        if !link_ids.is_empty() || !package_ids.is_empty() {
            session.link.move_to_downloads(&link_ids, &package_ids).await?;
        }
        Ok(json!({
            "success": true,
            "moved_links": link_ids.len(),
            "moved_packages": package_ids.len(),
        }))
    }

    pub async fn cleanup_linkgrabber(
        &self,
        link_ids: Vec<i64>,
        package_ids: Vec<i64>,
    ) -> Result<Value, ControlError> {
        let session = self.active().await?;
        if !link_ids.is_empty() || !package_ids.is_empty() {
            session.link.remove_grabber_links(&link_ids, &package_ids).await?;
        }
        Ok(json!({ "success": true, "message": "Linkgrabber cleaned" }))
    }

    /// Aggregate status: controller state plus byte/progress totals.
    ///
    /// A failed downloads query degrades to zero totals rather than failing
    /// the whole status call.
    pub async fn download_status(&self) -> Result<Value, ControlError> {
        let session = self.active().await?;
        let state = session.link.current_state().await?;

        let (total_bytes, loaded_bytes, active, total) =
            match session.link.query_downloads().await {
                Ok(items) => {
                    let mut total_bytes = 0i64;
                    let mut loaded_bytes = 0i64;
                    let mut active = 0usize;
                    for item in &items {
                        total_bytes += item.bytes_total;
                        loaded_bytes += item.bytes_loaded;
                        if item.status == STATUS_DOWNLOADING {
                            active += 1;
                        }
                    }
                    (total_bytes, loaded_bytes, active, items.len())
                }
                Err(e) => {
                    tracing::debug!(err = %e, "downloads query failed during status");
                    (0, 0, 0, 0)
                }
            };

        let progress = if total_bytes > 0 {
            round2(loaded_bytes as f64 / total_bytes as f64 * 100.0)
        } else {
            0.0
        };

        Ok(json!({
            "success": true,
            "state": state,
            "active_downloads": active,
            "total_downloads": total,
            "total_bytes": total_bytes,
            "loaded_bytes": loaded_bytes,
            "progress": progress,
        }))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
