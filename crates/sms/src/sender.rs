//! Outbound SMS delivery through the gateway's REST API.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use haulaway_core::config::SmsConfig;

/// Gateway-assigned identifier for an accepted outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSid(pub String);

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("sms gateway is not configured: missing {0}")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Delivers a single SMS. Implementations must not retry internally; callers
/// decide whether a failed send matters.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<MessageSid, SmsError>;
}

/// Real sender backed by the gateway's `POST /messages` endpoint.
pub struct HttpSmsSender {
    config: SmsConfig,
    client: reqwest::Client,
}

impl HttpSmsSender {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    to: &'a str,
    from: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    sid: String,
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<MessageSid, SmsError> {
        let api_base = self
            .config
            .api_base
            .as_deref()
            .ok_or(SmsError::NotConfigured("sms.api_base"))?;
        let api_token = self
            .config
            .api_token
            .as_ref()
            .ok_or(SmsError::NotConfigured("sms.api_token"))?;
        let from = self
            .config
            .from_number
            .as_deref()
            .ok_or(SmsError::NotConfigured("sms.from_number"))?;

        let request = SendMessageRequest { to, from, body };
        let response = self
            .client
            .post(format!("{}/messages", api_base.trim_end_matches('/')))
            .bearer_auth(api_token.expose_secret())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let accepted: SendMessageResponse = response.json().await?;
        debug!(sid = %accepted.sid, "outbound sms accepted");
        Ok(MessageSid(accepted.sid))
    }
}

/// Sender that keeps every message in memory instead of calling a gateway.
/// Used by handler tests and by `doctor`-style dry runs.
#[derive(Default)]
pub struct RecordingSmsSender {
    sent: tokio::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingSmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `(to, body)` pairs in send order.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl SmsSender for RecordingSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<MessageSid, SmsError> {
        let mut sent = self.sent.lock().await;
        sent.push((to.to_string(), body.to_string()));
        Ok(MessageSid(format!("recorded-{}", sent.len())))
    }
}
