//! Credential storage.
//!
//! The authentication service only talks to a [`CredentialStore`]. The store
//! owns durability of user records and is the authoritative guard for email
//! uniqueness: `create` must fail with [`StoreError::Duplicate`] when the email
//! is already taken, atomically, even if a concurrent request raced past the
//! service's own existence check.

pub mod memory;
pub mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use crate::models::{NewUser, StoredUser};
use async_trait::async_trait;

/// Storage errors surfaced to the service layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A user with this email already exists")]
    Duplicate,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(format!("Redis error: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("JSON error: {}", err))
    }
}

/// Persistence collaborator keyed by email.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact-match lookup. No case folding or trimming.
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError>;

    /// Persist a new user and assign its id.
    ///
    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<StoredUser, StoreError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Generate an opaque user id.
pub(crate) fn new_user_id() -> String {
    nanoid::nanoid!(16)
}
