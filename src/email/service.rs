use std::collections::BTreeMap;

use futures_util::future::join_all;
use log::{error, info, warn};
use serde::Serialize;

use crate::signup::TrialSignupData;

use super::{
    ArcEmailProvider, EmailDeliveryResult, EmailMessage, ProviderError, SenderIdentity, templates,
};

/// Sends transactional email through an ordered list of provider
/// backends. Per message the providers are tried in priority order and
/// the first success wins; the list itself is read-only configuration
/// supplied at construction.
pub struct MultiProviderEmailService {
    providers: Vec<ArcEmailProvider>,
    sender: SenderIdentity,
}

/// Outcome of the two independent sends for one signup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSignupDelivery {
    pub user_confirmation: EmailDeliveryResult,
    pub admin_notification: EmailDeliveryResult,
}

impl TrialSignupDelivery {
    pub fn all_delivered(&self) -> bool {
        self.user_confirmation.success && self.admin_notification.success
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailServiceHealth {
    pub healthy: bool,
    pub primary_provider: String,
    pub available_providers: Vec<String>,
    pub provider_health: BTreeMap<String, ProviderStatus>,
    pub details: String,
}

impl MultiProviderEmailService {
    pub fn new(providers: Vec<ArcEmailProvider>, sender: SenderIdentity) -> Self {
        Self { providers, sender }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Dispatches the confirmation and the admin alert for one signup.
    /// The two sends are independent and run concurrently; failures are
    /// reported in the returned results, never as an error.
    pub async fn send_trial_signup_emails(&self, data: &TrialSignupData) -> TrialSignupDelivery {
        let confirmation = templates::user_confirmation(&self.sender, data);
        let alert = templates::admin_notification(&self.sender, data);

        let (user_confirmation, admin_notification) = tokio::join!(
            self.send_with_fallback(&confirmation),
            self.send_with_fallback(&alert),
        );

        TrialSignupDelivery {
            user_confirmation,
            admin_notification,
        }
    }

    /// Tries the providers in priority order, stopping at the first
    /// success. When every provider fails, the result carries the last
    /// provider's error.
    async fn send_with_fallback(&self, message: &EmailMessage) -> EmailDeliveryResult {
        let mut last_failure: Option<(&'static str, ProviderError)> = None;
        for provider in &self.providers {
            match provider.send(message).await {
                Ok(sent) => {
                    info!("Email to {} delivered via {}", message.to, provider.name());
                    return EmailDeliveryResult::delivered(provider.name(), sent);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed to send to {}: {}",
                        provider.name(),
                        message.to,
                        e
                    );
                    last_failure = Some((provider.name(), e));
                }
            }
        }
        match last_failure {
            Some((provider, e)) => {
                error!("All providers failed for {}: {}", message.to, e);
                EmailDeliveryResult::failed(provider, e.to_string())
            }
            None => EmailDeliveryResult::failed("none", "no email providers configured".to_string()),
        }
    }

    /// Probes every provider and aggregates: healthy as long as at least
    /// one backend is reachable.
    pub async fn health_check(&self) -> EmailServiceHealth {
        let probes = join_all(
            self.providers
                .iter()
                .map(|provider| async move { (provider.name(), provider.health_check().await) }),
        )
        .await;

        let mut provider_health = BTreeMap::new();
        let mut available_providers = Vec::new();
        for (name, result) in probes {
            match result {
                Ok(()) => {
                    available_providers.push(name.to_string());
                    provider_health.insert(
                        name.to_string(),
                        ProviderStatus {
                            healthy: true,
                            error: None,
                        },
                    );
                }
                Err(e) => {
                    warn!("Provider {} is unhealthy: {}", name, e);
                    provider_health.insert(
                        name.to_string(),
                        ProviderStatus {
                            healthy: false,
                            error: Some(e.to_string()),
                        },
                    );
                }
            }
        }

        let primary_provider = self
            .providers
            .first()
            .map(|p| p.name().to_string())
            .unwrap_or_else(|| "none".to_string());
        let details = format!(
            "{}/{} providers available",
            available_providers.len(),
            self.providers.len()
        );

        EmailServiceHealth {
            healthy: !available_providers.is_empty(),
            primary_provider,
            available_providers,
            provider_health,
            details,
        }
    }
}
