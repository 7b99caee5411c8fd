use axum::{
    Json, Router,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use log::{error, info};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use crate::{
    app::{AppState, ServiceError},
    config::Environment,
};

pub mod trial_signup;

const MAX_BODY_BYTES: usize = 16 * 1024;

pub async fn run(
    state: AppState,
    port: u16,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) {
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .expect("Failed to bind HTTP listener");

    info!("Trial signup API listening on port {}", port);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .expect("HTTP server failed");

    info!("HTTP API shut down gracefully");
}

fn router(state: AppState) -> Router {
    let environment = state.environment;
    // The marketing site is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/trial-signup",
            post(trial_signup::submit)
                .get(trial_signup::health)
                .fallback(method_not_allowed),
        )
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn std::any::Any + Send + 'static>| handle_panic(environment, panic),
        ))
        .with_state(state)
}

async fn method_not_allowed() -> ServiceError {
    ServiceError::MethodNotAllowed
}

fn handle_panic(environment: Environment, panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {}", detail);

    let mut body = serde_json::json!({
        "success": false,
        "error": "Something went wrong. Please try again later.",
    });
    if !environment.is_production() {
        body["detail"] = serde_json::json!(detail);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
