//! # bizhub-adapter-webhook-reqwest
//!
//! Outbound HTTP adapter built on [reqwest](https://docs.rs/reqwest).
//!
//! Any HTTP status is reported back as a [`WebhookResponse`]; only transport
//! failures (DNS, connect, timeout) become errors.
//!
//! ## Dependency rule
//! Depends on `bizhub-app` (for the port trait) and `bizhub-domain` (for the
//! error type). The `app` and `domain` crates must never reference this adapter.

use std::time::Duration;

use serde::Deserialize;

use bizhub_app::ports::{WebhookClient, WebhookMethod, WebhookRequest, WebhookResponse};
use bizhub_domain::error::BizHubError;

/// Errors raised while talking to a webhook endpoint.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("unable to build http client")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<WebhookError> for BizHubError {
    fn from(err: WebhookError) -> Self {
        Self::External(Box::new(err))
    }
}

/// Client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whole-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("bizhub/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Client`] if the TLS backend cannot be initialised.
    pub fn build(self) -> Result<ReqwestWebhookClient, WebhookError> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs.max(1)))
            .user_agent(self.user_agent)
            .build()
            .map_err(WebhookError::Client)?;
        Ok(ReqwestWebhookClient { inner })
    }
}

/// [`WebhookClient`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestWebhookClient {
    inner: reqwest::Client,
}

fn method(method: WebhookMethod) -> reqwest::Method {
    match method {
        WebhookMethod::Post => reqwest::Method::POST,
        WebhookMethod::Put => reqwest::Method::PUT,
        WebhookMethod::Patch => reqwest::Method::PATCH,
    }
}

impl WebhookClient for ReqwestWebhookClient {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: WebhookRequest) -> Result<WebhookResponse, BizHubError> {
        let mut builder = self
            .inner
            .request(method(request.method), &request.url)
            .body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|source| WebhookError::Transport {
                url: request.url.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        tracing::debug!(status, "webhook answered");
        Ok(WebhookResponse { status })
    }
}
