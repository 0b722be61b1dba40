use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

use crate::config::NodeConfig;
use crate::credentials::{CredentialStore, TELEGRAM_API_CREDENTIALS};

/// Performs one authenticated call against the bot API.
///
/// Implementations own credentials, transport and timeouts; callers pass the
/// mapped request through and propagate whatever error comes back.
#[async_trait]
pub trait ApiDispatcher: Send + Sync {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Map<String, Value>,
        query: Map<String, Value>,
    ) -> Result<Value>;
}

/// `reqwest`-backed dispatcher for the Telegram Bot API.
pub struct HttpDispatcher {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpDispatcher {
    pub fn new(config: &NodeConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            credentials,
        })
    }

    fn endpoint_url(&self, token: &str, endpoint: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        // Not included in the error: the URL carries the token
        Url::parse(&format!("{}/bot{}/{}", base, token, endpoint))
            .with_context(|| format!("Invalid Telegram endpoint \"{}\"", endpoint))
    }
}

#[async_trait]
impl ApiDispatcher for HttpDispatcher {
    #[tracing::instrument(skip(self, body, query))]
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Map<String, Value>,
        query: Map<String, Value>,
    ) -> Result<Value> {
        let credentials = self
            .credentials
            .get_credentials(TELEGRAM_API_CREDENTIALS)
            .await?;
        let url = self.endpoint_url(&credentials.access_token, endpoint)?;

        let mut req = self.client.request(method, url);
        if !query.is_empty() {
            req = req.query(&query);
        }
        if !body.is_empty() {
            req = req.json(&body);
        }

        let response = req.send().await.map_err(|e| e.without_url())?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Telegram responded");

        if status.is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| e.without_url())
                .context("Failed to parse Telegram response");
        }

        if status == StatusCode::UNAUTHORIZED {
            bail!("The Telegram credentials are not valid!");
        }

        let payload: Value = response.json().await.unwrap_or(Value::Null);
        if let Some(description) = payload.get("description").and_then(Value::as_str) {
            bail!(
                "Telegram error response [{}]: {}",
                status.as_u16(),
                description
            );
        }

        bail!("Telegram request failed with status {}", status)
    }
}
