// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MyJDownloader cloud API client.
//!
//! Requests are signed with HMAC-SHA256 over the raw query string, keyed by
//! the login secret `sha256(lower(email) + password + "server")`. The query
//! string is built by hand because the signature covers the exact bytes sent.

use async_trait::async_trait;
use reqwest::Client;
use ring::hmac;
use sha2::{Digest, Sha256};

use crate::cloud::{
    select_device, CloudConnector, CloudSession, Credentials, DeviceInfo, DeviceLink,
};
use crate::error::ControlError;

/// Connector for the MyJDownloader cloud API.
pub struct MyJdConnector {
    base_url: String,
    app_key: String,
    client: Client,
}

impl MyJdConnector {
    pub fn new(base_url: String, app_key: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent("JDownloader")
            .build()
            .unwrap_or_default();
        Self { base_url, app_key, client }
    }

    /// Authenticate against `/my/connect` and return a signed transport.
    async fn authenticate(&self, creds: &Credentials) -> Result<MyJdTransport, ControlError> {
        let secret = login_secret(&creds.email, &creds.password, "server");
        let query = format!("email={}&appkey={}", creds.email, self.app_key);
        let signature = sign(&secret, &query);
        let url = format!("{}/my/connect?{query}&signature={signature}", self.base_url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ControlError::Auth(format!("Connection error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ControlError::Auth(format!(
                "Connection failed with status {status}: {body}"
            )));
        }
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ControlError::Auth(format!("Connection error: {e}")))?;

        let session_token = data
            .get("sessiontoken")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ControlError::Auth("No session token received".to_owned()))?
            .to_owned();

        Ok(MyJdTransport {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            secret,
            session_token,
        })
    }
}

#[async_trait]
impl CloudConnector for MyJdConnector {
    async fn connect(&self, creds: &Credentials) -> Result<CloudSession, ControlError> {
        let transport = self.authenticate(creds).await?;
        let devices = transport.list_devices().await?;
        if devices.is_empty() {
            return Err(ControlError::NoDevicesFound);
        }
        let device = select_device(&devices, creds.device_name.as_deref())
            .ok_or(ControlError::NoDevicesFound)?;
        let link = MyJdDeviceLink { transport, device_id: device.id.clone() };
        Ok(CloudSession { device, link: Box::new(link) })
    }

    async fn list_devices(&self, creds: &Credentials) -> Result<Vec<DeviceInfo>, ControlError> {
        let transport = self.authenticate(creds).await?;
        transport.list_devices().await
    }
}

/// Signed HTTP transport for one cloud session.
struct MyJdTransport {
    base_url: String,
    client: Client,
    secret: [u8; 32],
    session_token: String,
}

impl MyJdTransport {
    /// `POST /my/listdevices` with a signed session query.
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, ControlError> {
        let query = format!("sessiontoken={}&rid={}", self.session_token, request_id());
        let signature = sign(&self.secret, &query);
        let url = format!("{}/my/listdevices?{query}&signature={signature}", self.base_url);

        let resp = self.client.post(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ControlError::Transport(format!(
                "List devices failed with status {status}"
            )));
        }
        let data: serde_json::Value = resp.json().await?;
        let devices = data
            .get("list")
            .cloned()
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .unwrap_or_default();
        Ok(devices)
    }

    /// Signed POST to a device sub-resource endpoint.
    async fn device_call(
        &self,
        device_id: &str,
        path: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, ControlError> {
        let rid = request_id();
        let query = format!("sessiontoken={}&rid={rid}", self.session_token);
        let signature = sign(&self.secret, &query);
        let url = format!(
            "{}/t_{}_{}{path}?{query}&signature={signature}",
            self.base_url, self.session_token, device_id
        );

        // Device endpoints take params as JSON-encoded strings.
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        let body = serde_json::json!({
            "url": path,
            "params": params,
            "rid": rid,
            "apiVer": 1,
        });

        let resp = self.client.post(url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ControlError::Transport(format!(
                "Device call {path} failed with status {status}"
            )));
        }
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ControlError::Transport(e.to_string()))
    }

    /// `GET /my/disconnect` — invalidates the session token.
    async fn disconnect(&self) -> Result<(), ControlError> {
        let query = format!("sessiontoken={}&rid={}", self.session_token, request_id());
        let signature = sign(&self.secret, &query);
        let url = format!("{}/my/disconnect?{query}&signature={signature}", self.base_url);
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ControlError::Transport(format!(
                "Disconnect failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Device sub-resource operations over the signed transport.
struct MyJdDeviceLink {
    transport: MyJdTransport,
    device_id: String,
}

impl MyJdDeviceLink {
    async fn call(
        &self,
        path: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, ControlError> {
        self.transport.device_call(&self.device_id, path, params).await
    }

    /// Deserialize the `data` array of a query response, tolerating gaps.
    fn data_items<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Vec<T> {
        value
            .get("data")
            .cloned()
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeviceLink for MyJdDeviceLink {
    async fn add_links(&self, urls: &[String], package_name: &str) -> Result<(), ControlError> {
        let query = serde_json::json!({
            "autostart": false,
            "links": urls.join("\n"),
            "packageName": package_name,
            "extractPassword": null,
            "priority": "DEFAULT",
            "downloadPassword": null,
            "destinationFolder": null,
        });
        self.call("/linkgrabberv2/addLinks", vec![query]).await?;
        Ok(())
    }

    async fn query_downloads(&self) -> Result<Vec<super::DownloadItem>, ControlError> {
        let query = serde_json::json!({
            "bytesTotal": true,
            "bytesLoaded": true,
            "speed": true,
            "eta": true,
            "enabled": true,
            "finished": true,
            "status": true,
            "url": true,
        });
        let value = self.call("/downloadsV2/queryLinks", vec![query]).await?;
        Ok(Self::data_items(value))
    }

    async fn query_download_packages(&self) -> Result<serde_json::Value, ControlError> {
        let value = self.call("/downloadsV2/queryPackages", vec![serde_json::json!({})]).await?;
        Ok(value.get("data").cloned().unwrap_or(serde_json::Value::Array(vec![])))
    }

    async fn query_grabber(&self) -> Result<Vec<super::LinkGrabberItem>, ControlError> {
        let query = serde_json::json!({
            "bytesTotal": true,
            "enabled": true,
            "url": true,
            "packageUUIDs": true,
        });
        let value = self.call("/linkgrabberv2/queryLinks", vec![query]).await?;
        Ok(Self::data_items(value))
    }

    async fn query_grabber_packages(&self) -> Result<serde_json::Value, ControlError> {
        let value = self.call("/linkgrabberv2/queryPackages", vec![serde_json::json!({})]).await?;
        Ok(value.get("data").cloned().unwrap_or(serde_json::Value::Array(vec![])))
    }

    async fn resume_links(&self, link_ids: &[i64]) -> Result<(), ControlError> {
        self.call("/downloadsV2/resumeLinks", vec![serde_json::json!(link_ids)]).await?;
        Ok(())
    }

    async fn set_enabled(&self, enabled: bool, link_ids: &[i64]) -> Result<(), ControlError> {
        self.call(
            "/downloadsV2/setEnabled",
            vec![serde_json::json!(enabled), serde_json::json!(link_ids), serde_json::json!([])],
        )
        .await?;
        Ok(())
    }

    async fn start_downloads(&self) -> Result<(), ControlError> {
        self.call("/downloadcontroller/start", vec![]).await?;
        Ok(())
    }

    async fn pause_downloads(&self) -> Result<(), ControlError> {
        self.call("/downloadcontroller/pause", vec![serde_json::json!(true)]).await?;
        Ok(())
    }

    async fn stop_downloads(&self) -> Result<(), ControlError> {
        self.call("/downloadcontroller/stop", vec![]).await?;
        Ok(())
    }

    async fn remove_download_links(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError> {
        self.call(
            "/downloadsV2/removeLinks",
            vec![serde_json::json!(link_ids), serde_json::json!(package_ids)],
        )
        .await?;
        Ok(())
    }

    async fn remove_grabber_links(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError> {
        self.call(
            "/linkgrabberv2/removeLinks",
            vec![serde_json::json!(link_ids), serde_json::json!(package_ids)],
        )
        .await?;
        Ok(())
    }

    async fn move_to_downloads(
        &self,
        link_ids: &[i64],
        package_ids: &[i64],
    ) -> Result<(), ControlError> {
        self.call(
            "/linkgrabberv2/moveToDownloadlist",
            vec![serde_json::json!(link_ids), serde_json::json!(package_ids)],
        )
        .await?;
        Ok(())
    }

    async fn current_state(&self) -> Result<String, ControlError> {
        let value = self.call("/downloadcontroller/getCurrentState", vec![]).await?;
        Ok(value
            .get("data")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN")
            .to_owned())
    }

    async fn disconnect(&self) -> Result<(), ControlError> {
        self.transport.disconnect().await
    }
}

/// Login secret: `sha256(lower(email) + password + lower(domain))`.
fn login_secret(email: &str, password: &str, domain: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(email.to_lowercase().as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(domain.to_lowercase().as_bytes());
    hasher.finalize().into()
}

/// HMAC-SHA256 signature over the raw query string, hex-encoded.
fn sign(secret: &[u8], data: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let tag = hmac::sign(&key, data.as_bytes());
    to_hex(tag.as_ref())
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Request IDs are epoch milliseconds; the cloud requires them to increase.
fn request_id() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
#[path = "myjd_tests.rs"]
mod tests;
