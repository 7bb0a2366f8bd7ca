//! Registration, login and logout.
//!
//! `AuthService` is the only place that hashes passwords or issues session
//! credentials. It holds no per-session state: a credential is delivered through
//! a [`SessionTransport`] and afterwards only its signature and expiry matter.

use super::password::{PasswordError, PasswordHasher};
use super::token::{TokenError, TokenSigner};
use super::transport::{SessionTransport, TransportError};
use crate::models::{unix_now, NewUser, UserSummary};
use crate::storage::{CredentialStore, StoreError};
use std::sync::Arc;
use zeroize::Zeroizing;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("User already exists")]
    DuplicateIdentity,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Password hashing failed: {0}")]
    Password(#[from] PasswordError),

    #[error("Token issuance failed: {0}")]
    Token(#[from] TokenError),

    #[error("Session transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AuthError::DuplicateIdentity,
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    signer: TokenSigner,
    /// Verified against when the email is unknown, so both login failures
    /// cost one hash verification.
    dummy_hash: String,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("hasher", &self.hasher)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        signer: TokenSigner,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash(&nanoid::nanoid!(32))?;
        Ok(AuthService {
            store,
            hasher,
            signer,
            dummy_hash,
        })
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Create an account and start a session for it.
    pub async fn register<T: SessionTransport>(
        &self,
        fullname: &str,
        email: &str,
        password: &str,
        transport: &mut T,
    ) -> Result<UserSummary, AuthError> {
        require(fullname, "fullname")?;
        require(email, "email")?;
        require(password, "password")?;

        if self.store.find_by_email(email).await?.is_some() {
            tracing::info!(action = "register_rejected", reason = "duplicate", "Email already registered");
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hash_password(password).await?;

        // The store re-checks uniqueness atomically; a lost race surfaces
        // as StoreError::Duplicate and maps to DuplicateIdentity.
        let user = self
            .store
            .create(NewUser {
                fullname: fullname.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        let credential = self.signer.issue(&user.id, unix_now())?;
        transport.issue(&credential)?;

        tracing::info!(action = "user_registered", user_id = %user.id, "New user registered");

        Ok(UserSummary::from(&user))
    }

    /// Check credentials and start a session.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login<T: SessionTransport>(
        &self,
        email: &str,
        password: &str,
        transport: &mut T,
    ) -> Result<UserSummary, AuthError> {
        let user = if email.is_empty() {
            None
        } else {
            self.store.find_by_email(email).await?
        };

        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let matches = self.verify_password(password, stored_hash).await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                tracing::warn!(action = "login_failed", "Invalid email or password");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let credential = self.signer.issue(&user.id, unix_now())?;
        transport.issue(&credential)?;

        tracing::info!(action = "login", user_id = %user.id, "User logged in");

        Ok(UserSummary::from(&user))
    }

    /// End the client's session. Never touches the store and always succeeds
    /// unless the transport itself fails.
    pub fn logout<T: SessionTransport>(&self, transport: &mut T) -> Result<(), AuthError> {
        transport.clear()?;
        tracing::info!(action = "logout", "Session cleared");
        Ok(())
    }

    /// Resolve a presented credential to its user id.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.signer.verify(token, unix_now()).map(|claims| claims.sub)
    }

    /// Load the user a credential belongs to.
    pub async fn current_user(&self, token: &str) -> Result<UserSummary, AuthError> {
        let user_id = self.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session credential");
            AuthError::Unauthenticated
        })?;

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        Ok(UserSummary::from(&user))
    }

    /// Argon2 is CPU-bound; run it off the async workers.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: &str, stored_hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))?
            .map_err(AuthError::from)
    }
}
