use std::sync::Arc;

use log::info;

use crate::{
    app::AppState,
    config::AppConfig,
    email::{
        ArcEmailProvider, MultiProviderEmailService, resend::ResendEmailProvider,
        sendgrid::SendGridEmailProvider, smtp::SmtpEmailProvider,
    },
};

mod app;
mod config;
mod email;
mod http;
mod logs;
mod signup;
mod util;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    logs::init_logger();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Priority order: resend, then sendgrid, then the SMTP relay.
    let mut providers: Vec<ArcEmailProvider> = Vec::new();
    if let Some(resend) = &config.email.resend {
        providers.push(Arc::new(ResendEmailProvider::new(
            resend,
            &config.email.sender,
        )));
    }
    if let Some(sendgrid) = &config.email.sendgrid {
        providers.push(Arc::new(SendGridEmailProvider::new(
            sendgrid,
            &config.email.sender,
        )));
    }
    if let Some(smtp) = &config.email.smtp {
        providers.push(Arc::new(
            SmtpEmailProvider::new(smtp, &config.email.sender)
                .expect("Failed to configure SMTP provider"),
        ));
    }

    let email_service = Arc::new(MultiProviderEmailService::new(
        providers,
        config.email.sender.clone(),
    ));
    info!(
        "Email providers configured: {}",
        email_service.provider_names().join(", ")
    );

    let state = AppState {
        email_service,
        environment: config.environment,
    };

    info!("Starting application");
    http::run(state, config.http_port, shutdown_signal()).await;
}
