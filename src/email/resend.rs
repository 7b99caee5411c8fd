use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::ResendConfig;

use super::{EmailMessage, EmailProvider, PROVIDER_TIMEOUT, ProviderError, SenderIdentity, SentEmail};

const API_BASE_URL: &str = "https://api.resend.com";

/// Resend JSON API backend.
pub struct ResendEmailProvider {
    client: Client,
    api_key: String,
    from: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ResendSendResponse {
    id: String,
}

impl ResendEmailProvider {
    pub fn new(config: &ResendConfig, sender: &SenderIdentity) -> Self {
        let client = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key: config.api_key.clone(),
            from: format!("{} <{}>", sender.studio_name, sender.from),
            base_url: API_BASE_URL.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl EmailProvider for ResendEmailProvider {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, ProviderError> {
        let mut payload = json!({
            "from": self.from,
            "to": [message.to],
            "subject": message.subject,
            "text": message.text,
        });
        if let Some(html) = &message.html {
            payload["html"] = json!(html);
        }

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let sent: ResendSendResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("invalid response body: {}", e)))?;
        Ok(SentEmail {
            message_id: Some(sent.id),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(format!("{}/domains", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}
