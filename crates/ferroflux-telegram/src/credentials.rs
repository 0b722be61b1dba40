use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

/// Credential type the Telegram node requires.
pub const TELEGRAM_API_CREDENTIALS: &str = "telegramApi";

pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "TELEGRAM_ACCESS_TOKEN";

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramApiCredentials {
    #[serde(alias = "accessToken")]
    pub access_token: String,
}

// Never print the token.
impl std::fmt::Debug for TelegramApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApiCredentials")
            .field("access_token", &"***")
            .finish()
    }
}

/// Trait for retrieving bot credentials, abstracting the host's store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve credentials of the given type (e.g. `telegramApi`).
    async fn get_credentials(&self, credential_type: &str) -> Result<TelegramApiCredentials>;
}

/// Reads the bot token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    token_var: String,
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESS_TOKEN_ENV)
    }
}

impl EnvCredentialStore {
    pub fn new(token_var: impl Into<String>) -> Self {
        Self {
            token_var: token_var.into(),
        }
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get_credentials(&self, credential_type: &str) -> Result<TelegramApiCredentials> {
        match env::var(&self.token_var) {
            Ok(token) if !token.is_empty() => Ok(TelegramApiCredentials {
                access_token: token,
            }),
            _ => Err(anyhow!(
                "No credentials got returned! '{}' needs '{}' set in the environment",
                credential_type,
                self.token_var
            )),
        }
    }
}

/// In-memory credentials keyed by credential type.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    entries: HashMap<String, TelegramApiCredentials>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, credential_type: &str, access_token: impl Into<String>) -> Self {
        self.entries.insert(
            credential_type.to_string(),
            TelegramApiCredentials {
                access_token: access_token.into(),
            },
        );
        self
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn get_credentials(&self, credential_type: &str) -> Result<TelegramApiCredentials> {
        self.entries
            .get(credential_type)
            .cloned()
            .ok_or_else(|| anyhow!("No credentials got returned!"))
    }
}
