//! Google Chat webhook adapter.
//!
//! Implements the [`alerting::WebhookTransport`] trait for Google Chat
//! incoming webhooks: one `POST` of the rendered card with
//! `Content-Type: application/json`, returning the raw status and body for the
//! [`alerting`] crate to interpret.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport and connection handling live here. The
//! [`alerting`] crate sees only [`alerting::WebhookTransport`].
//!
//! No request timeout is configured; the client's defaults apply, and the
//! delivery runtime's own deadline bounds the invocation. Error messages never
//! include the webhook URL, which carries the space key and token.

use alerting::{DeliveryError, RenderedMessage, WebhookReply, WebhookTransport, WebhookUrl};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::debug;

/// `User-Agent` sent with every webhook request.
pub const USER_AGENT: &str = concat!("alert-forwarder/", env!("CARGO_PKG_VERSION"));

/// Errors raised while constructing the adapter.
#[derive(Debug, Error)]
pub enum ChatClientError {
    /// The underlying HTTP client could not be initialised (e.g. TLS backend).
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Posts messages to one Google Chat incoming webhook.
#[derive(Debug, Clone)]
pub struct GoogleChatWebhook {
    client: reqwest::Client,
    url: WebhookUrl,
}

impl GoogleChatWebhook {
    /// Creates an adapter for `url` with a freshly built HTTP client.
    pub fn new(url: WebhookUrl) -> Result<Self, ChatClientError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, url))
    }

    /// Creates an adapter that reuses an existing HTTP client.
    pub fn with_client(client: reqwest::Client, url: WebhookUrl) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl WebhookTransport for GoogleChatWebhook {
    #[tracing::instrument(name = "chat_webhook_post", skip_all)]
    async fn deliver(&self, body: &RenderedMessage) -> Result<WebhookReply, DeliveryError> {
        let response = self
            .client
            .post(self.url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body.as_str().to_owned())
            .send()
            .await
            .map_err(|e| DeliveryError::Send(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DeliveryError::Read(e.without_url().to_string()))?;

        debug!(
            host = %self.url.redacted(),
            status,
            bytes = bytes.len(),
            "Webhook responded"
        );
        Ok(WebhookReply {
            status,
            body: bytes.to_vec(),
        })
    }
}
