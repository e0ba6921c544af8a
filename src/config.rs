//! Plugin configuration

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;

/// Environment variable that overrides `api_key`
pub const API_KEY_ENV: &str = "SPAMTROLL_API_KEY";

/// Settings consumed read-only by the dashboard and the API client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Key sent in the `X-API-Key` header
    pub api_key: String,
    /// URL of the scan endpoint; the API base is derived from it
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Filter log to derive statistics from
    pub log_file: PathBuf,
    /// Location of the JSON stats cache
    pub cache_file: PathBuf,
    /// Cache time-to-live in seconds
    pub cache_ttl_secs: u64,
    /// How many trailing log lines feed the statistics
    pub tail_lines: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: String::new(),
            timeout_secs: 10,
            log_file: PathBuf::from("/var/log/spamtroll/spamtroll.log"),
            cache_file: PathBuf::from(
                "/usr/local/directadmin/plugins/spamtroll/data/cache/stats.json",
            ),
            cache_ttl_secs: 300,
            tail_lines: 10_000,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!(action = "load", component = "config", file_path = ?path, "Loading settings from file");
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.api_key = key;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.tail_lines == 0 {
            return Err(ConfigError::Invalid(
                "tail_lines must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// API base URL: `api_url` without its final path segment.
    ///
    /// `https://api.example.com/api/v1/check` becomes `https://api.example.com/api/v1`.
    /// A URL without a path, or one that does not parse, is returned as configured.
    pub fn api_base_url(&self) -> String {
        let trimmed = self.api_url.trim();
        let Ok(mut url) = url::Url::parse(trimmed) else {
            return trimmed.to_string();
        };

        let has_segment = url
            .path_segments()
            .map(|mut segments| segments.any(|s| !s.is_empty()))
            .unwrap_or(false);
        if !has_segment {
            return trimmed.trim_end_matches('/').to_string();
        }

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().pop();
        }
        url.set_query(None);
        url.set_fragment(None);
        url.as_str().trim_end_matches('/').to_string()
    }
}
