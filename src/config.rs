use thiserror::Error;

use crate::email::SenderIdentity;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} env var not set")]
    MissingVar(&'static str),

    #[error("{0} must be a valid port number")]
    InvalidPort(&'static str),

    #[error(
        "no email provider configured, set at least one of STUDIO_RESEND_API_KEY, STUDIO_SENDGRID_API_KEY or STUDIO_SMTP_HOST"
    )]
    NoEmailProvider,
}

/// Gates how much error detail leaves the server on unexpected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub http_port: u16,
    pub email: EmailConfig,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender: SenderIdentity,
    pub resend: Option<ResendConfig>,
    pub sendgrid: Option<SendGridConfig>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct SendGridConfig {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port = require("STUDIO_HTTP_PORT")?
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("STUDIO_HTTP_PORT"))?;
        let environment = Environment::parse(optional("STUDIO_ENVIRONMENT").as_deref());

        let sender = SenderIdentity {
            studio_name: require("STUDIO_NAME")?,
            from: require("STUDIO_EMAIL_FROM")?,
            admin_recipient: require("STUDIO_ADMIN_EMAIL")?,
        };

        let resend = optional("STUDIO_RESEND_API_KEY").map(|api_key| ResendConfig { api_key });
        let sendgrid = optional("STUDIO_SENDGRID_API_KEY").map(|api_key| SendGridConfig { api_key });
        let smtp = match optional("STUDIO_SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                user: require("STUDIO_SMTP_USER")?,
                password: require("STUDIO_SMTP_PASSWORD")?,
            }),
            None => None,
        };

        if resend.is_none() && sendgrid.is_none() && smtp.is_none() {
            return Err(ConfigError::NoEmailProvider);
        }

        Ok(Self {
            environment,
            http_port,
            email: EmailConfig {
                sender,
                resend,
                sendgrid,
                smtp,
            },
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_is_recognized_case_insensitively() {
        assert!(Environment::parse(Some("production")).is_production());
        assert!(Environment::parse(Some("PRODUCTION")).is_production());
    }

    #[test]
    fn anything_else_is_development() {
        assert!(!Environment::parse(Some("staging")).is_production());
        assert!(!Environment::parse(None).is_production());
    }
}
