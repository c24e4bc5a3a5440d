// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Name of the MyJDownloader settings file under `<jd_home>/cfg/`.
pub const SETTINGS_FILE: &str = "org.jdownloader.api.myjdownloader.MyJDownloaderSettings.json";

/// Configuration for the jdbridge server.
#[derive(Debug, Clone, clap::Parser)]
pub struct BridgeConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "JDBRIDGE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9665, env = "JDBRIDGE_PORT")]
    pub port: u16,

    /// Shared-secret API key for REST endpoints. If unset, auth is disabled.
    #[arg(long, env = "JDBRIDGE_API_KEY")]
    pub api_key: Option<String>,

    /// JDownloader installation directory.
    #[arg(long, default_value = "/opt/jd2", env = "JDOWNLOADER_HOME")]
    pub jd_home: PathBuf,

    /// MyJDownloader cloud API base URL.
    #[arg(long, default_value = "https://api.jdownloader.org", env = "JDBRIDGE_API_URL")]
    pub api_url: String,

    /// App key reported to the cloud on connect.
    #[arg(long, default_value = "jd2controller", env = "JDBRIDGE_APP_KEY")]
    pub app_key: String,

    /// Default monitoring broadcast interval in seconds.
    #[arg(long, default_value_t = 2.0, env = "JDBRIDGE_MONITOR_INTERVAL_SECS")]
    pub monitor_interval_secs: f64,
}

impl BridgeConfig {
    pub fn settings_path(&self) -> PathBuf {
        self.jd_home.join("cfg").join(SETTINGS_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.jd_home.join("logs")
    }
}
