// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local JDownloader process lifecycle: status/start/stop/restart via
//! `pgrep`, `kill`, and `java -jar`.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub pid: Option<i32>,
    pub jar_path: String,
    pub jar_exists: bool,
}

pub struct ServiceManager {
    jd_home: PathBuf,
}

impl ServiceManager {
    pub fn new(jd_home: PathBuf) -> Self {
        Self { jd_home }
    }

    fn jar_path(&self) -> PathBuf {
        self.jd_home.join("JDownloader.jar")
    }

    /// PID of the running JDownloader process, if any.
    pub async fn running_pid(&self) -> Option<i32> {
        let output =
            Command::new("pgrep").args(["-f", "JDownloader.jar"]).output().await.ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
    }

    pub async fn status(&self) -> ServiceStatus {
        let pid = self.running_pid().await;
        let jar = self.jar_path();
        ServiceStatus {
            running: pid.is_some(),
            pid,
            jar_path: jar.display().to_string(),
            jar_exists: jar.exists(),
        }
    }

    /// Start the process headless and detached, then verify it came up.
    pub async fn start(&self) -> anyhow::Result<String> {
        if let Some(pid) = self.running_pid().await {
            return Ok(format!("JDownloader is already running (PID: {pid})"));
        }
        let jar = self.jar_path();
        if !jar.exists() {
            anyhow::bail!("JDownloader.jar not found at {}", jar.display());
        }

        let mut cmd = Command::new("java");
        cmd.arg("-Djava.awt.headless=true")
            .arg("-jar")
            .arg(&jar)
            .arg("-norestart")
            .current_dir(&self.jd_home)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        // Detach into a new process group so it survives bridge restarts.
        cmd.process_group(0);
        cmd.spawn()?;

        tokio::time::sleep(Duration::from_secs(2)).await;
        match self.running_pid().await {
            Some(pid) => Ok(format!("JDownloader started successfully (PID: {pid})")),
            None => anyhow::bail!("JDownloader failed to start"),
        }
    }

    /// TERM first, escalate to KILL if the process is still alive.
    pub async fn stop(&self) -> anyhow::Result<String> {
        let Some(pid) = self.running_pid().await else {
            return Ok("JDownloader is not running".to_owned());
        };

        Command::new("kill").arg(pid.to_string()).status().await?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        if self.running_pid().await.is_none() {
            Ok(format!("JDownloader stopped (PID: {pid})"))
        } else {
            Command::new("kill").args(["-9", &pid.to_string()]).status().await?;
            Ok(format!("JDownloader force stopped (PID: {pid})"))
        }
    }

    pub async fn restart(&self) -> anyhow::Result<String> {
        let stop_msg = self.stop().await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let start_msg = self.start().await?;
        Ok(format!("Restart: {stop_msg} -> {start_msg}"))
    }
}
