use reqwest::Client;
use serde_json::json;

use crate::config::SendGridConfig;

use super::{EmailMessage, EmailProvider, PROVIDER_TIMEOUT, ProviderError, SenderIdentity, SentEmail};

const API_BASE_URL: &str = "https://api.sendgrid.com";

/// SendGrid v3 backend. A successful send is a 202 with the message id in
/// the `X-Message-Id` response header.
pub struct SendGridEmailProvider {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
    base_url: String,
}

impl SendGridEmailProvider {
    pub fn new(config: &SendGridConfig, sender: &SenderIdentity) -> Self {
        let client = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key: config.api_key.clone(),
            from_email: sender.from.clone(),
            from_name: sender.studio_name.clone(),
            base_url: API_BASE_URL.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl EmailProvider for SendGridEmailProvider {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, ProviderError> {
        let mut content = vec![json!({ "type": "text/plain", "value": message.text })];
        if let Some(html) = &message.html {
            content.push(json!({ "type": "text/html", "value": html }));
        }
        let payload = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": self.from_email, "name": self.from_name },
            "subject": message.subject,
            "content": content,
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
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
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Ok(SentEmail { message_id })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(format!("{}/v3/scopes", self.base_url))
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
