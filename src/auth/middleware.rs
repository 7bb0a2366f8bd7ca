//! Shared state and the authenticated-user extractor.

use super::password::PasswordHasher;
use super::service::{AuthError, AuthService};
use super::token::TokenSigner;
use super::transport::CookieSettings;
use crate::config::Config;
use crate::error::AppError;
use crate::models::UserSummary;
use crate::storage::CredentialStore;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub cookies: Arc<CookieSettings>,
}

impl AppState {
    /// Wire the service and cookie settings from configuration.
    pub fn new(store: Arc<dyn CredentialStore>, config: &Config) -> Result<Self, AuthError> {
        // Must fail here, never inside register after the record is written
        let cookies = CookieSettings::new(
            config.session_cookie_name.clone(),
            config.cookie_secure,
            config.session_ttl_secs,
        )?;

        let hasher = PasswordHasher::new(config.password_hash_cost)?;
        let signer = TokenSigner::new(config.jwt_secret.as_bytes(), config.session_ttl_secs);
        let auth = AuthService::new(store, hasher, signer)?;

        Ok(AppState {
            auth: Arc::new(auth),
            cookies: Arc::new(cookies),
        })
    }
}

/// Authenticated user extractor.
///
/// Reads the session credential from the cookie (or `Authorization: Bearer`),
/// verifies it, and loads the user. Returns 401 Unauthorized if missing or invalid.
pub struct CurrentUser(pub UserSummary);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = state
            .cookies
            .extract(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

        let user = state.auth.current_user(&token).await?;

        Ok(CurrentUser(user))
    }
}
