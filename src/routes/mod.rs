//! API route handlers.

pub mod auth;
pub mod health;

use crate::auth::middleware::AppState;
use crate::config::Config;
use crate::middleware::security_headers;
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Auth endpoints
        .route("/api/auth/user/register", post(auth::register))
        .route("/api/auth/user/login", post(auth::login))
        .route("/api/auth/user/logout", post(auth::logout))
        .route("/api/auth/user/me", get(auth::me))
}

/// Build the full application: routes, body limit, CORS, tracing, and
/// security headers.
pub fn app(state: AppState, config: &Config) -> Router {
    // Without a configured origin, CorsLayer::new() rejects all cross-origin requests.
    let cors = match &config.cors_allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]),
        None => CorsLayer::new(),
    };

    api_router()
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state)
}
