use std::sync::Arc;

use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{config::Environment, email::MultiProviderEmailService, signup::FieldError};

#[derive(Clone)]
pub struct AppState {
    pub email_service: Arc<MultiProviderEmailService>,
    pub environment: Environment,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServiceError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "success": false,
                    "error": "Validation failed",
                    "errors": errors,
                }),
            ),
            ServiceError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "error": msg }),
            ),
            ServiceError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                serde_json::json!({ "success": false, "error": "Method not allowed" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
