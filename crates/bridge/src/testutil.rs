// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared unit-test fixtures: an in-memory cloud fake and state builders.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::cloud::{
    CloudConnector, CloudSession, Credentials, DeviceInfo, DeviceLink, DownloadItem,
    LinkGrabberItem,
};
use crate::config::BridgeConfig;
use crate::error::ControlError;
use crate::settings::SettingsStore;
use crate::state::AppState;

/// Call log shared between a test and the fake link it handed out.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn download_item(name: &str, status: &str, total: i64, loaded: i64) -> DownloadItem {
    DownloadItem {
        name: name.to_owned(),
        status: status.to_owned(),
        bytes_total: total,
        bytes_loaded: loaded,
        speed: 0,
        eta: -1,
        enabled: true,
        finished: false,
        uuid: 1,
        url: format!("https://example.com/{name}"),
    }
}

/// Device link that records every call and serves canned data.
pub struct FakeLink {
    pub calls: CallLog,
    pub downloads: Vec<DownloadItem>,
    pub grabber: Vec<LinkGrabberItem>,
    pub state: String,
    /// Fail only the download-queue query; other calls still succeed.
    pub fail_downloads_query: bool,
}

impl FakeLink {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            downloads: Vec::new(),
            grabber: Vec::new(),
            state: "IDLE".to_owned(),
            fail_downloads_query: false,
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

}

#[async_trait]
impl DeviceLink for FakeLink {
    async fn add_links(&self, urls: &[String], package_name: &str) -> Result<(), ControlError> {
        self.record(format!("add_links:{}:{package_name}", urls.len()));
        Ok(())
    }

    async fn query_downloads(&self) -> Result<Vec<DownloadItem>, ControlError> {
        self.record("query_downloads");
        if self.fail_downloads_query {
            return Err(ControlError::Transport("query failed".to_owned()));
        }
        Ok(self.downloads.clone())
    }

    async fn query_download_packages(&self) -> Result<serde_json::Value, ControlError> {
        self.record("query_download_packages");
        Ok(json!([]))
    }

    async fn query_grabber(&self) -> Result<Vec<LinkGrabberItem>, ControlError> {
        self.record("query_grabber");
        Ok(self.grabber.clone())
    }

    async fn query_grabber_packages(&self) -> Result<serde_json::Value, ControlError> {
        self.record("query_grabber_packages");
        Ok(json!([]))
    }

    async fn resume_links(&self, link_ids: &[i64]) -> Result<(), ControlError> {
        self.record(format!("resume_links:{link_ids:?}"));
        Ok(())
    }

    async fn set_enabled(&self, enabled: bool, link_ids: &[i64]) -> Result<(), ControlError> {
        self.record(format!("set_enabled:{enabled}:{link_ids:?}"));
        Ok(())
    }

    async fn start_downloads(&self) -> Result<(), ControlError> {
        self.record("start_downloads");
        Ok(())
    }

    async fn pause_downloads(&self) -> Result<(), ControlError> {
        self.record("pause_downloads");
        Ok(())
    }

    async fn stop_downloads(&self) -> Result<(), ControlError> {
        self.record("stop_downloads");
        Ok(())
    }

    async fn remove_download_links(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError> {
        self.record(format!("remove_download_links:{link_ids:?}:{package_ids:?}"));
        Ok(())
    }

    async fn remove_grabber_links(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError> {
        self.record(format!("remove_grabber_links:{link_ids:?}:{package_ids:?}"));
        Ok(())
    }

    async fn move_to_downloads(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError> {
        self.record(format!("move_to_downloads:{link_ids:?}:{package_ids:?}"));
        Ok(())
    }

    async fn current_state(&self) -> Result<String, ControlError> {
        self.record("current_state");
        Ok(self.state.clone())
    }

    async fn disconnect(&self) -> Result<(), ControlError> {
        self.record("disconnect");
        Ok(())
    }
}

/// Connector that hands out [`FakeLink`]s wired to a shared call log.
pub struct FakeConnector {
    pub calls: CallLog,
    pub devices: Vec<DeviceInfo>,
    pub downloads: Vec<DownloadItem>,
    pub state: String,
    pub fail_downloads_query: bool,
    /// Shared so a test can inject failures after the connector moved into
    /// an `Arc<dyn CloudConnector>`.
    pub connect_error: Arc<Mutex<Option<ControlError>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            devices: vec![device("jd-main", "dev-1")],
            downloads: Vec::new(),
            state: "IDLE".to_owned(),
            fail_downloads_query: false,
            connect_error: Arc::new(Mutex::new(None)),
        }
    }
}

pub fn device(name: &str, id: &str) -> DeviceInfo {
    DeviceInfo {
        name: name.to_owned(),
        id: id.to_owned(),
        device_type: "jd".to_owned(),
        status: "ONLINE".to_owned(),
    }
}

#[async_trait]
impl CloudConnector for FakeConnector {
    async fn connect(&self, creds: &Credentials) -> Result<CloudSession, ControlError> {
        if let Some(err) = self.connect_error.lock().unwrap().clone() {
            return Err(err);
        }
        let device = crate::cloud::select_device(&self.devices, creds.device_name.as_deref())
            .ok_or(ControlError::NoDevicesFound)?;
        let mut link = FakeLink::new(Arc::clone(&self.calls));
        link.downloads = self.downloads.clone();
        link.state = self.state.clone();
        link.fail_downloads_query = self.fail_downloads_query;
        Ok(CloudSession { device, link: Box::new(link) })
    }

    async fn list_devices(&self, _creds: &Credentials) -> Result<Vec<DeviceInfo>, ControlError> {
        if let Some(err) = self.connect_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.devices.clone())
    }
}

pub fn test_config(jd_home: &Path) -> BridgeConfig {
    BridgeConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        api_key: None,
        jd_home: jd_home.to_path_buf(),
        api_url: "http://127.0.0.1:1".to_owned(),
        app_key: "jd2controller".to_owned(),
        monitor_interval_secs: 2.0,
    }
}

pub fn store_with_credentials(jd_home: &Path) -> SettingsStore {
    let store = SettingsStore::new(test_config(jd_home).settings_path());
    store.update_credentials("user@example.com", "secret123", Some("jd-main")).unwrap();
    store
}

/// Full `AppState` over a fake connector with stored credentials.
/// Returns the temp dir (keep it alive), the state, and the fake's call log.
pub fn test_state(connector: FakeConnector) -> (tempfile::TempDir, Arc<AppState>, CallLog) {
    let dir = tempfile::tempdir().unwrap();
    store_with_credentials(dir.path());
    let calls = Arc::clone(&connector.calls);
    let state = Arc::new(AppState::new(
        test_config(dir.path()),
        Arc::new(connector),
        CancellationToken::new(),
    ));
    (dir, state, calls)
}
