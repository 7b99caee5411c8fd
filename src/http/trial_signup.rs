use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use axum_extra::{TypedHeader, headers::UserAgent};
use log::info;
use serde::Serialize;

use crate::{
    app::{AppState, ServiceError, ServiceResult},
    email::service::{EmailServiceHealth, TrialSignupDelivery},
    signup::{SignupMetadata, TrialSignupData, TrialSignupForm},
    util,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSignupResponse {
    success: bool,
    message: String,
    trial_details: TrialDetails,
    all_emails_delivered: bool,
    email_delivery: TrialSignupDelivery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialDetails {
    name: String,
    email: String,
    selected_class: String,
    experience: String,
}

/// `POST /api/trial-signup`. The signup itself succeeds with a 201 even
/// when email delivery fails; delivery problems only show up in the
/// diagnostic fields.
pub async fn submit(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    headers: HeaderMap,
    payload: Result<Json<TrialSignupForm>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<TrialSignupResponse>)> {
    let Json(form) = payload.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;

    let (user, trial) = form.validate().map_err(ServiceError::Validation)?;
    let metadata = SignupMetadata::new(
        user_agent
            .as_ref()
            .and_then(|TypedHeader(ua)| util::sanitize_user_agent(ua.as_str())),
        util::client_ip(
            header_str(&headers, "x-forwarded-for"),
            header_str(&headers, "x-real-ip"),
        ),
    );
    let data = TrialSignupData {
        user,
        trial,
        metadata,
    };

    info!(
        "New trial signup from {} for {}",
        data.user.email, data.trial.selected_class
    );

    let delivery = state.email_service.send_trial_signup_emails(&data).await;
    let all_emails_delivered = delivery.all_delivered();

    let response = TrialSignupResponse {
        success: true,
        message: format!(
            "Thanks {}, your trial class request has been received!",
            data.user.first_name
        ),
        trial_details: TrialDetails {
            name: data.user.full_name(),
            email: data.user.email.clone(),
            selected_class: data.trial.selected_class.clone(),
            experience: data.trial.experience.clone(),
        },
        all_emails_delivered,
        email_delivery: delivery,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/trial-signup`. 200 while at least one provider is
/// reachable, 503 otherwise; the body carries per-provider detail.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<EmailServiceHealth>) {
    let health = state.email_service.health_check().await;
    let status = if health.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::response::IntoResponse;

    use crate::{
        config::Environment,
        email::{ArcEmailProvider, MockEmailProvider, MultiProviderEmailService, SenderIdentity},
    };

    use super::*;

    fn sender() -> SenderIdentity {
        SenderIdentity {
            studio_name: "Studio Motion".to_string(),
            from: "noreply@studiomotion.test".to_string(),
            admin_recipient: "frontdesk@studiomotion.test".to_string(),
        }
    }

    fn test_state(providers: Vec<ArcEmailProvider>) -> AppState {
        AppState {
            email_service: Arc::new(MultiProviderEmailService::new(providers, sender())),
            environment: Environment::Development,
        }
    }

    fn sofia_form() -> TrialSignupForm {
        TrialSignupForm {
            first_name: Some("Sofia".to_string()),
            last_name: Some("Martinez".to_string()),
            email: Some("sofia@test.com".to_string()),
            phone: None,
            selected_class: Some("Salsa".to_string()),
            experience: Some("beginner".to_string()),
            goals: Some(vec!["fun".to_string()]),
            hear_about: None,
        }
    }

    async fn submit_form(state: AppState, form: TrialSignupForm) -> ServiceResult<(StatusCode, Json<TrialSignupResponse>)> {
        submit(
            State(state),
            Some(TypedHeader(UserAgent::from_static("test-agent"))),
            HeaderMap::new(),
            Ok(Json(form)),
        )
        .await
    }

    #[tokio::test]
    async fn valid_signup_returns_201_with_trial_details() {
        let provider = MockEmailProvider::working("resend");
        let state = test_state(vec![Arc::new(provider.clone())]);

        let (status, Json(body)) = submit_form(state, sofia_form()).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
        assert_eq!(body.trial_details.name, "Sofia Martinez");
        assert_eq!(body.trial_details.selected_class, "Salsa");
        assert!(body.all_emails_delivered);
        assert_eq!(body.email_delivery.user_confirmation.provider, "resend");
        assert_eq!(provider.get_messages().len(), 2);
    }

    #[tokio::test]
    async fn missing_field_returns_validation_error() {
        let state = test_state(vec![Arc::new(MockEmailProvider::working("resend"))]);
        let form = TrialSignupForm {
            email: None,
            ..sofia_form()
        };

        let error = submit_form(state, form).await.unwrap_err();

        match error {
            ServiceError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.field == "email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn validation_error_maps_to_400() {
        let response =
            ServiceError::Validation(vec![]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn email_failure_still_returns_201() {
        let state = test_state(vec![
            Arc::new(MockEmailProvider::failing("resend")),
            Arc::new(MockEmailProvider::failing("smtp")),
        ]);

        let (status, Json(body)) = submit_form(state, sofia_form()).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
        assert!(!body.all_emails_delivered);
        assert!(!body.email_delivery.user_confirmation.success);
        assert!(!body.email_delivery.admin_notification.success);
    }

    #[tokio::test]
    async fn signup_records_sanitized_metadata() {
        let provider = MockEmailProvider::working("resend");
        let state = test_state(vec![Arc::new(provider.clone())]);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        let result = submit(
            State(state),
            Some(TypedHeader(UserAgent::from_static("Mozilla/5.0"))),
            headers,
            Ok(Json(sofia_form())),
        )
        .await;

        assert!(result.is_ok());
        let admin_message = provider
            .get_messages()
            .into_iter()
            .find(|m| m.to == "frontdesk@studiomotion.test")
            .unwrap();
        assert!(admin_message.text.contains("203.0.113.7"));
        assert!(admin_message.text.contains("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn health_returns_200_when_any_provider_up() {
        let state = test_state(vec![
            Arc::new(MockEmailProvider::failing("resend")),
            Arc::new(MockEmailProvider::working("smtp")),
        ]);

        let (status, Json(body)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.healthy);
        assert_eq!(body.primary_provider, "resend");
    }

    #[tokio::test]
    async fn health_returns_503_when_all_providers_down() {
        let state = test_state(vec![
            Arc::new(MockEmailProvider::failing("resend")),
            Arc::new(MockEmailProvider::failing("smtp")),
        ]);

        let (status, Json(body)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.healthy);
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        let response = super::super::method_not_allowed().await.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
