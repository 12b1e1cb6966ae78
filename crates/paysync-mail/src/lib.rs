//! Transactional email capability: "send email given from/to/subject/html".
//!
//! [`MailerSendClient`] is the production implementation
//! (`POST {base}/v1/email`, bearer auth).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

pub const MAILERSEND_BASE_URL: &str = "https://api.mailersend.com";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail API timed out after {0:?}")]
    Timeout(Duration),

    #[error("mail API unreachable: {0}")]
    Transport(String),

    #[error("mail API rejected message (http {status})")]
    Rejected { status: u16, body: Value },
}

impl MailError {
    /// Short reason for API callers: the provider's `message` if it sent one.
    pub fn reason(&self) -> String {
        match self {
            MailError::Rejected { body, .. } => body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| self.to_string()),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, msg: &EmailMessage) -> Result<(), MailError>;
}

#[derive(Clone)]
pub struct MailerSendClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for MailerSendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerSendClient")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MailerSendClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(api_key, MAILERSEND_BASE_URL, timeout)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout,
        }
    }

    fn classify(&self, e: reqwest::Error) -> MailError {
        if e.is_timeout() {
            MailError::Timeout(self.timeout)
        } else {
            MailError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Mailer for MailerSendClient {
    async fn send(&self, msg: &EmailMessage) -> Result<(), MailError> {
        let url = format!("{}/v1/email", self.base_url.trim_end_matches('/'));
        let body = json!({
            "from": { "email": msg.from },
            "to": [{ "email": msg.to }],
            "subject": msg.subject,
            "html": msg.html,
        });
        debug!(to = %msg.to, "mail send");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.map_err(|e| self.classify(e))?;
        let body = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }));
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
