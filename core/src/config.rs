//! Client configuration.
//!
//! Defaults target the production backend with a 10 second timeout for
//! ordinary calls and 30 seconds for uploads. `from_env` lets a developer
//! point the client at a local mock server without recompiling.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://agri-wealth-api.onrender.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u64 = 30_000;

pub const ENV_BASE_URL: &str = "AGRI_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "AGRI_API_TIMEOUT_MS";
pub const ENV_UPLOAD_TIMEOUT_MS: &str = "AGRI_API_UPLOAD_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub upload_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            upload_timeout_ms: DEFAULT_UPLOAD_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `AGRI_API_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = parse_millis(ENV_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_UPLOAD_TIMEOUT_MS) {
            config.upload_timeout_ms = parse_millis(ENV_UPLOAD_TIMEOUT_MS, &ms)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::Configuration(format!(
                "base_url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 || self.upload_timeout_ms == 0 {
            return Err(ApiError::Configuration("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::Configuration(format!("{key} must be a number of milliseconds, got {raw:?}")))
}
