use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub mod resend;
pub mod sendgrid;
pub mod service;
pub mod smtp;
mod templates;

pub use service::MultiProviderEmailService;

/// Upper bound on a single provider call, enforced at the transport.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Who the studio sends as, and where admin alerts go.
#[derive(Debug, Clone)]
pub struct SenderIdentity {
    pub studio_name: String,
    pub from: String,
    pub admin_recipient: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    BuildMessage(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A transactional email backend. Implementations wrap one concrete
/// delivery channel and must not retry internally; the fallback chain is
/// owned by [`MultiProviderEmailService`].
#[async_trait::async_trait]
pub trait EmailProvider {
    fn name(&self) -> &'static str;

    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, ProviderError>;

    /// Cheap reachability probe, never a real send.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

pub type ArcEmailProvider = Arc<dyn EmailProvider + Send + Sync + 'static>;

/// Outcome of one fallback chain for one recipient category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryResult {
    pub success: bool,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmailDeliveryResult {
    pub fn delivered(provider: &str, sent: SentEmail) -> Self {
        Self {
            success: true,
            provider: provider.to_string(),
            message_id: sent.message_id,
            error: None,
        }
    }

    pub fn failed(provider: &str, error: String) -> Self {
        Self {
            success: false,
            provider: provider.to_string(),
            message_id: None,
            error: Some(error),
        }
    }
}

#[derive(Clone)]
#[allow(unused)]
pub struct MockEmailProvider {
    name: &'static str,
    fail_sends: bool,
    fail_recipient: Option<String>,
    healthy: bool,
    pub sent_messages: Arc<Mutex<Vec<EmailMessage>>>,
}

#[allow(unused)]
impl MockEmailProvider {
    pub fn working(name: &'static str) -> Self {
        Self {
            name,
            fail_sends: false,
            fail_recipient: None,
            healthy: true,
            sent_messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail_sends: true,
            healthy: false,
            ..Self::working(name)
        }
    }

    /// Healthy provider that fails only for the given recipient.
    pub fn failing_for(name: &'static str, recipient: &str) -> Self {
        Self {
            fail_recipient: Some(recipient.to_string()),
            ..Self::working(name)
        }
    }

    pub fn get_messages(&self) -> Vec<EmailMessage> {
        self.sent_messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EmailProvider for MockEmailProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, ProviderError> {
        if self.fail_sends || self.fail_recipient.as_deref() == Some(message.to.as_str()) {
            return Err(ProviderError::Transport(format!(
                "{} is unavailable",
                self.name
            )));
        }
        let mut sent = self.sent_messages.lock().unwrap();
        sent.push(message.clone());
        Ok(SentEmail {
            message_id: Some(format!("{}-{}", self.name, sent.len())),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.healthy {
            Ok(())
        } else {
            Err(ProviderError::Transport(format!(
                "{} probe failed",
                self.name
            )))
        }
    }
}
