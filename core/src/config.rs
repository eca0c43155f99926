//! Provider configuration.
//!
//! Values come from code or from the environment:
//! - `DATA_PROVIDER_API_URL`: backend base URL (required)
//! - `DATA_PROVIDER_TIMEOUT_SECS`: per-request timeout for the default
//!   transport (optional)

use std::time::Duration;

use crate::error::ApiError;

pub const API_URL_VAR: &str = "DATA_PROVIDER_API_URL";
pub const TIMEOUT_VAR: &str = "DATA_PROVIDER_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_url: String,
    pub timeout: Option<Duration>,
}

impl ProviderConfig {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_url = lookup(API_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{API_URL_VAR} is not set")))?;
        let mut config = Self::new(api_url.trim());
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| ApiError::Config(format!("{TIMEOUT_VAR}={raw}: {e}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}
