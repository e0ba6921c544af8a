//! Client for the remote spam-scoring API.
//!
//! Every call returns an [`ApiResponse`]; nothing here returns an error to the
//! caller. A missing key fails before any network traffic, transport problems
//! become `Connection failed: ...`, and non-2xx answers come back with
//! `success == false` and the status code and body filled in.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Settings;

const API_KEY_HEADER: &str = "X-API-Key";
const DEFAULT_CLIENT_IP: &str = "127.0.0.1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: None,
            data: None,
            raw: None,
            error: Some(message.into()),
        }
    }
}

pub struct ApiClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client_ip: String,
    http: reqwest::Result<Client>,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.trim().to_string(),
            base_url: settings.api_base_url(),
            timeout: settings.timeout(),
            client_ip: DEFAULT_CLIENT_IP.to_string(),
            http: Client::builder()
                .user_agent(concat!("spamtroll-panel/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }

    /// Address reported as `ip_address` in content checks.
    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = ip.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn test_connection(&self) -> ApiResponse {
        self.request(Method::GET, "/scan/status", None)
    }

    pub fn get_account_usage(&self) -> ApiResponse {
        self.request(Method::GET, "/account/usage", None)
    }

    /// Submit sample content for scoring. `source` tags the origin, e.g. `email`.
    pub fn check_spam(&self, content: &str, source: &str) -> ApiResponse {
        let body = json!({
            "content": content,
            "source": source,
            "ip_address": self.client_ip,
        });
        self.request(Method::POST, "/scan/check", Some(&body))
    }

    fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> ApiResponse {
        if !self.is_configured() {
            return ApiResponse::failure("API key not configured");
        }

        let http = match &self.http {
            Ok(http) => http,
            Err(e) => return ApiResponse::failure(format!("Connection failed: {e}")),
        };

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);
        let start_time = Instant::now();

        let mut builder = http
            .request(method.clone(), &url)
            .timeout(self.timeout)
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send() {
            Ok(response) => response,
            Err(e) => {
                warn!(action = "request", component = "api_client", method = %method, url = %url, error = %e, "API request failed");
                return ApiResponse::failure(format!("Connection failed: {e}"));
            }
        };

        let status = response.status();
        let raw = match response.text() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(action = "read", component = "api_client", url = %url, error = %e, "Failed to read API response");
                return ApiResponse::failure(format!("Connection failed: {e}"));
            }
        };
        let data = serde_json::from_str::<Value>(&raw).ok();

        info!(
            action = "complete",
            component = "api_client",
            method = %method,
            url = %url,
            status = status.as_u16(),
            duration_ms = start_time.elapsed().as_millis(),
            "API request completed"
        );

        ApiResponse {
            success: status.is_success(),
            code: Some(status.as_u16()),
            data,
            raw: Some(raw),
            error: None,
        }
    }
}
