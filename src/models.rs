//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.
//! Storage models represent Redis data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Models
// ============================================================================

/// Request to register a new account.
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Request to log in with email and password.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub fullname: String,
}

impl From<&StoredUser> for UserSummary {
    fn from(user: &StoredUser) -> Self {
        UserSummary {
            id: user.id.clone(),
            email: user.email.clone(),
            fullname: user.fullname.clone(),
        }
    }
}

/// Response after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserSummary,
}

/// Response carrying only the current user.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserSummary,
}

/// Plain `{ "message": ... }` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ============================================================================
// Storage Models
// ============================================================================

/// User data as stored in Redis.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub password_hash: String, // argon2id PHC string
    pub created_at: u64,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields needed to create a user. The store assigns `id` and `created_at`.
#[derive(Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl NewUser {
    /// Materialize the record with a store-assigned id.
    pub fn into_stored(self, id: String) -> StoredUser {
        StoredUser {
            id,
            fullname: self.fullname,
            email: self.email,
            password_hash: self.password_hash,
            created_at: unix_now(),
        }
    }
}

/// Current time in whole seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
