use std::str::FromStr;

use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use uuid::Uuid;

use crate::config::SmtpConfig;

use super::{EmailMessage, EmailProvider, PROVIDER_TIMEOUT, ProviderError, SenderIdentity, SentEmail};

/// SMTP relay backend. The relay does not hand back a message id, so one
/// is generated locally and stamped on the message before sending.
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    message_id_domain: String,
}

impl SmtpEmailProvider {
    pub fn new(config: &SmtpConfig, sender: &SenderIdentity) -> Result<Self, ProviderError> {
        let address = Address::from_str(&sender.from)
            .map_err(|e| ProviderError::InvalidAddress(format!("'{}': {}", sender.from, e)))?;
        let message_id_domain = address.domain().to_string();
        let from = Mailbox::new(Some(sender.studio_name.clone()), address);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| ProviderError::Transport(format!("failed to create SMTP transport: {}", e)))?
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .timeout(Some(PROVIDER_TIMEOUT))
            .build();
        Ok(Self {
            transport,
            from,
            message_id_domain,
        })
    }
}

#[async_trait::async_trait]
impl EmailProvider for SmtpEmailProvider {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &EmailMessage) -> Result<SentEmail, ProviderError> {
        let to = Mailbox::from_str(&message.to)
            .map_err(|e| ProviderError::InvalidAddress(format!("'{}': {}", message.to, e)))?;
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.message_id_domain);
        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(message_id.clone()));
        let email = match &message.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                html.clone(),
            )),
            None => builder.body(message.text.clone()),
        }
        .map_err(|e| ProviderError::BuildMessage(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(SentEmail {
            message_id: Some(message_id),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProviderError::Transport(
                "SMTP connection test failed".to_string(),
            )),
            Err(e) => Err(ProviderError::Transport(e.to_string())),
        }
    }
}
