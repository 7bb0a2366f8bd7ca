//! Auth API endpoints.

use crate::auth::middleware::{AppState, CurrentUser};
use crate::auth::transport::CookieTransport;
use crate::error::AppError;
use crate::models::{
    AuthResponse, CurrentUserResponse, LoginRequest, MessageResponse, RegisterRequest,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use zeroize::Zeroizing;

/// POST /api/auth/user/register - Create an account and set the session cookie
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let password = Zeroizing::new(req.password);

    let mut transport = CookieTransport::new(&state.cookies);
    let user = state
        .auth
        .register(&req.fullname, &req.email, &password, &mut transport)
        .await?;

    Ok((
        StatusCode::CREATED,
        transport.into_headers(),
        Json(AuthResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

/// POST /api/auth/user/login - Verify credentials and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let password = Zeroizing::new(req.password);

    let mut transport = CookieTransport::new(&state.cookies);
    let user = state
        .auth
        .login(&req.email, &password, &mut transport)
        .await?;

    Ok((
        StatusCode::OK,
        transport.into_headers(),
        Json(AuthResponse {
            message: "User logged in successfully",
            user,
        }),
    ))
}

/// POST /api/auth/user/logout - Clear the session cookie
///
/// Succeeds whether or not the client presented a session.
pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut transport = CookieTransport::new(&state.cookies);
    state.auth.logout(&mut transport)?;

    Ok((
        StatusCode::OK,
        transport.into_headers(),
        Json(MessageResponse {
            message: "User logged out successfully",
        }),
    ))
}

/// GET /api/auth/user/me - Return the user the session belongs to
pub async fn me(CurrentUser(user): CurrentUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse { user })
}
