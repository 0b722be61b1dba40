use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

use crate::credentials::DEFAULT_ACCESS_TOKEN_ENV;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Runtime settings for the Telegram node's dispatcher.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Bot API root; requests go to `{api_base_url}/bot{token}/{endpoint}`.
    pub api_base_url: Url,
    /// Environment variable holding the bot token.
    pub access_token_env: String,
    /// `None` leaves the HTTP client without a timeout.
    pub request_timeout: Option<Duration>,
}

impl NodeConfig {
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            access_token_env: DEFAULT_ACCESS_TOKEN_ENV.to_string(),
            request_timeout: None,
        }
    }

    /// Loads `.env` (if present) and reads `TELEGRAM_API_BASE_URL`,
    /// `TELEGRAM_ACCESS_TOKEN_ENV` and `TELEGRAM_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("TELEGRAM_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url =
            Url::parse(&base).with_context(|| format!("Invalid TELEGRAM_API_BASE_URL: {}", base))?;
        let mut config = Self::new(api_base_url);

        if let Some(var) = lookup("TELEGRAM_ACCESS_TOKEN_ENV") {
            config.access_token_env = var;
        }
        if let Some(secs) = lookup("TELEGRAM_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid TELEGRAM_REQUEST_TIMEOUT_SECS: {}", secs))?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        tracing::debug!(base_url = %config.api_base_url, timeout = ?config.request_timeout, "Telegram node config loaded");
        Ok(config)
    }
}
