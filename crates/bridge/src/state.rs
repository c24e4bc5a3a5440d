// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cloud::CloudConnector;
use crate::config::BridgeConfig;
use crate::controller::Controller;
use crate::registry::ConnectionRegistry;
use crate::service::ServiceManager;
use crate::settings::SettingsStore;

/// Shared server state.
pub struct AppState {
    pub config: BridgeConfig,
    pub settings: SettingsStore,
    pub controller: Controller,
    pub registry: ConnectionRegistry,
    pub connector: Arc<dyn CloudConnector>,
    pub service: ServiceManager,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: BridgeConfig,
        connector: Arc<dyn CloudConnector>,
        shutdown: CancellationToken,
    ) -> Self {
        let settings = SettingsStore::new(config.settings_path());
        let controller = Controller::new(Arc::clone(&connector), settings.clone());
        let service = ServiceManager::new(config.jd_home.clone());
        Self {
            config,
            settings,
            controller,
            registry: ConnectionRegistry::new(),
            connector,
            service,
            shutdown,
        }
    }
}

/// Current time as an RFC 3339 timestamp, the format every envelope carries.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
