use crate::auth::middleware::AppState;
use crate::error::AppError;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// GET /health - Liveness plus a store round trip
pub async fn health(State(state): State<AppState>) -> Response {
    match state.auth.store().ping().await {
        Ok(()) => Json(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "store": "ok",
        }))
        .into_response(),
        Err(e) => AppError::ServiceUnavailable(e.to_string()).into_response(),
    }
}
