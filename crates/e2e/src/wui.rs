//! HTTP client for the printer's web interface
//!
//! Thin wrapper over reqwest bound to the simulator's proxied base URL.
//! Response bodies are kept as opaque JSON values; the tests inspect them
//! by key.

use std::time::Duration;
use tracing::debug;

use wui_sim::actions::network;
use wui_sim::PrinterHandle;

use crate::error::{E2eError, E2eResult};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// API key the test firmware images are provisioned with
pub const DEFAULT_API_KEY: &str = "0123456789";

/// Authenticated API endpoints under `/api/`
pub const API_ENDPOINTS: [&str; 4] = ["version", "printer", "job", "files"];

/// Client session bound to one printer's web interface
pub struct WuiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WuiClient {
    /// Create a client for a base URL
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a client bound to a running simulator
    pub fn for_printer(printer: &PrinterHandle, api_key: impl Into<String>) -> E2eResult<Self> {
        Self::new(network::wui_base_url(printer), api_key)
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a path without authentication
    pub async fn get(&self, path: &str) -> E2eResult<reqwest::Response> {
        debug!("GET {}", path);
        Ok(self.http.get(self.url(path)).send().await?)
    }

    /// GET a path with an explicit API key
    pub async fn get_with_key(&self, path: &str, key: &str) -> E2eResult<reqwest::Response> {
        debug!("GET {} (keyed)", path);
        Ok(self
            .http
            .get(self.url(path))
            .header(API_KEY_HEADER, key)
            .send()
            .await?)
    }

    /// GET a path expecting a 2xx HTML response; returns the body
    pub async fn get_html(&self, path: &str) -> E2eResult<String> {
        let response = self.get(path).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(E2eError::UnexpectedStatus {
                path: path.to_string(),
                expected: 200,
                got: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// GET an `/api/` endpoint with the session's API key
    pub async fn api_get(&self, endpoint: &str) -> E2eResult<reqwest::Response> {
        self.get_with_key(&format!("/api/{}", endpoint), &self.api_key)
            .await
    }

    /// GET an `/api/` endpoint, asserting 2xx + JSON content type, and
    /// parse the body
    pub async fn api_get_json(&self, endpoint: &str) -> E2eResult<serde_json::Value> {
        let path = format!("/api/{}", endpoint);
        let response = self.api_get(endpoint).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(E2eError::UnexpectedStatus {
                path,
                expected: 200,
                got: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !content_type
            .as_deref()
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false)
        {
            return Err(E2eError::UnexpectedContentType {
                path,
                got: content_type,
            });
        }

        Ok(response.json().await?)
    }

    /// Current printer status (telemetry, temperatures, state flags)
    pub async fn printer_status(&self) -> E2eResult<serde_json::Value> {
        self.api_get_json("printer").await
    }

    /// Current or most recent job
    pub async fn job_status(&self) -> E2eResult<serde_json::Value> {
        self.api_get_json("job").await
    }

    /// Firmware / API version info
    pub async fn version(&self) -> E2eResult<serde_json::Value> {
        self.api_get_json("version").await
    }

    /// Multipart upload to `/api/files/sdcard`
    pub async fn upload_sdcard(
        &self,
        filename: &str,
        content: Vec<u8>,
        with_key: bool,
    ) -> E2eResult<reqwest::Response> {
        let part = reqwest::multipart::Part::bytes(content).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.http.post(self.url("/api/files/sdcard")).multipart(form);
        if with_key {
            request = request.header(API_KEY_HEADER, &self.api_key);
        }

        debug!("POST /api/files/sdcard ({}, keyed: {})", filename, with_key);
        Ok(request.send().await?)
    }
}
