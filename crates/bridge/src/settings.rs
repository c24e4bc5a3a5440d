// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MyJDownloader settings file: load/save to JSON with atomic writes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cloud::Credentials;

/// Contents of the MyJDownloader settings file.
///
/// Field names mirror the file format JDownloader itself writes, so the
/// bridge can share the file with a running instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JdSettings {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_device_name")]
    pub devicename: String,
    #[serde(default = "default_true", rename = "autoconnectenabledv2")]
    pub autoconnect_enabled: bool,
    #[serde(default = "default_server_host")]
    pub serverhost: String,
}

impl Default for JdSettings {
    fn default() -> Self {
        Self {
            email: None,
            password: String::new(),
            devicename: default_device_name(),
            autoconnect_enabled: true,
            serverhost: default_server_host(),
        }
    }
}

fn default_device_name() -> String {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_owned());
    format!("JDownloader@{host}")
}

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "api.jdownloader.org".to_owned()
}

/// Handle on the settings file path; all reads/writes go through here.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the settings file, falling back to defaults when the file is
    /// missing or unparsable.
    pub fn read(&self) -> JdSettings {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), err = %e, "unparsable settings file, using defaults");
                JdSettings::default()
            }),
            Err(_) => JdSettings::default(),
        }
    }

    /// Save the settings file atomically (write tmp + rename).
    ///
    /// Uses a unique temp filename (PID + counter) to avoid corruption when
    /// concurrent saves race on the same `.tmp` file.
    pub fn save(&self, settings: &JdSettings) -> anyhow::Result<()> {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Validate and store a new email/password pair.
    pub fn update_credentials(
        &self,
        email: &str,
        password: &str,
        device_name: Option<&str>,
    ) -> anyhow::Result<()> {
        if email.is_empty() || !email.contains('@') {
            anyhow::bail!("invalid email address: {email}");
        }
        if password.len() < 6 {
            anyhow::bail!("password must be at least 6 characters");
        }
        let mut settings = self.read();
        settings.email = Some(email.to_owned());
        settings.password = password.to_owned();
        settings.autoconnect_enabled = true;
        if let Some(name) = device_name {
            settings.devicename = name.to_owned();
        }
        self.save(&settings)
    }

    /// Blank out the stored email/password.
    pub fn clear_credentials(&self) -> anyhow::Result<()> {
        let mut settings = self.read();
        settings.email = None;
        settings.password = String::new();
        self.save(&settings)
    }

    /// Return usable credentials, or `None` when email or password is unset.
    pub fn credentials(&self) -> Option<Credentials> {
        let settings = self.read();
        let email = settings.email.filter(|e| !e.is_empty())?;
        if settings.password.is_empty() {
            return None;
        }
        Some(Credentials {
            email,
            password: settings.password,
            device_name: Some(settings.devicename),
        })
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
