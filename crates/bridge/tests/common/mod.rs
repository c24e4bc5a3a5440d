// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared integration-test fixtures: an in-memory cloud fake plus server
//! builders for the REST and WebSocket tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use jdbridge::cloud::{
    select_device, CloudConnector, CloudSession, Credentials, DeviceInfo, DeviceLink,
    DownloadItem, LinkGrabberItem,
};
use jdbridge::config::BridgeConfig;
use jdbridge::error::ControlError;
use jdbridge::settings::SettingsStore;
use jdbridge::state::AppState;
use jdbridge::transport::build_router;

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub struct FakeLink {
    calls: CallLog,
    downloads: Vec<DownloadItem>,
    state: String,
}

impl FakeLink {
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
        Ok(self.downloads.clone())
    }

    async fn query_download_packages(&self) -> Result<serde_json::Value, ControlError> {
        Ok(json!([]))
    }

    async fn query_grabber(&self) -> Result<Vec<LinkGrabberItem>, ControlError> {
        Ok(Vec::new())
    }

    async fn query_grabber_packages(&self) -> Result<serde_json::Value, ControlError> {
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
        Ok(self.state.clone())
    }

    async fn disconnect(&self) -> Result<(), ControlError> {
        self.record("disconnect");
        Ok(())
    }
}

pub struct FakeConnector {
    pub calls: CallLog,
    pub devices: Vec<DeviceInfo>,
    pub downloads: Vec<DownloadItem>,
    pub state: String,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            devices: vec![fake_device("jd-main", "dev-1")],
            downloads: Vec::new(),
            state: "IDLE".to_owned(),
        }
    }
}

pub fn fake_device(name: &str, id: &str) -> DeviceInfo {
    DeviceInfo {
        name: name.to_owned(),
        id: id.to_owned(),
        device_type: "jd".to_owned(),
        status: "ONLINE".to_owned(),
    }
}

pub fn fake_download(name: &str, status: &str, total: i64, loaded: i64) -> DownloadItem {
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

#[async_trait]
impl CloudConnector for FakeConnector {
    async fn connect(&self, creds: &Credentials) -> Result<CloudSession, ControlError> {
        let device = select_device(&self.devices, creds.device_name.as_deref())
            .ok_or(ControlError::NoDevicesFound)?;
        let link = FakeLink {
            calls: Arc::clone(&self.calls),
            downloads: self.downloads.clone(),
            state: self.state.clone(),
        };
        Ok(CloudSession { device, link: Box::new(link) })
    }

    async fn list_devices(&self, _creds: &Credentials) -> Result<Vec<DeviceInfo>, ControlError> {
        Ok(self.devices.clone())
    }
}

pub fn test_config(jd_home: &Path, api_key: Option<&str>) -> BridgeConfig {
    BridgeConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        api_key: api_key.map(str::to_owned),
        jd_home: jd_home.to_path_buf(),
        api_url: "http://127.0.0.1:1".to_owned(),
        app_key: "jd2controller".to_owned(),
        monitor_interval_secs: 2.0,
    }
}

pub fn write_credentials(jd_home: &Path) {
    let store = SettingsStore::new(test_config(jd_home, None).settings_path());
    store
        .update_credentials("user@example.com", "secret123", Some("jd-main"))
        .expect("write test credentials");
}

/// `AppState` over the fake connector. Keep the returned temp dir alive for
/// the duration of the test.
pub fn build_state(
    connector: FakeConnector,
    api_key: Option<&str>,
) -> (tempfile::TempDir, Arc<AppState>) {
    let dir = tempfile::tempdir().expect("create temp jd_home");
    write_credentials(dir.path());
    let state = Arc::new(AppState::new(
        test_config(dir.path(), api_key),
        Arc::new(connector),
        CancellationToken::new(),
    ));
    (dir, state)
}

pub fn test_server(state: Arc<AppState>) -> axum_test::TestServer {
    axum_test::TestServer::new(build_router(state)).expect("failed to create test server")
}

/// Serve the router on a real socket for WebSocket tests.
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test socket");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
