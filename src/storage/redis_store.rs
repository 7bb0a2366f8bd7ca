//! Redis-backed credential store.
//!
//! Redis key patterns:
//! - `user:{id}` - individual user data (JSON)
//! - `email:{email}` - email lookup to user_id (STRING)
//!
//! Users are permanent, so neither key carries a TTL. The email key is the
//! uniqueness guard: it is claimed together with the user key inside a single
//! Lua script, so two concurrent registrations for the same email cannot both
//! succeed.
//!
//! ## Security: Zeroizing Sensitive Data
//!
//! User JSON contains the password hash. Raw JSON read back from Redis is
//! wrapped in `Zeroizing` so the buffer is cleared once deserialized.

use super::{new_user_id, CredentialStore, StoreError};
use crate::models::{NewUser, StoredUser};
use async_trait::async_trait;
use redis::AsyncCommands;
use zeroize::Zeroizing;

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

fn email_key(email: &str) -> String {
    format!("email:{}", email)
}

/// Atomically claim the email key and write the user record.
///
/// Returns `1` on success, `0` if the email is already registered.
const CREATE_USER_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('SET', KEYS[2], ARGV[2])
return 1
";

/// Get a user by ID.
///
/// The user JSON is zeroized after deserialization.
pub async fn get_user<C>(con: &mut C, id: &str) -> Result<Option<StoredUser>, StoreError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(user_key(id)).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            let user = serde_json::from_str(&zeroizing_data)?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Get a user by email.
///
/// Performs a two-step lookup: email -> user_id -> user data.
pub async fn get_user_by_email<C>(
    con: &mut C,
    email: &str,
) -> Result<Option<StoredUser>, StoreError>
where
    C: AsyncCommands,
{
    let user_id: Option<String> = con.get(email_key(email)).await?;

    match user_id {
        Some(id) => get_user(con, &id).await,
        None => Ok(None),
    }
}

/// Insert a user, failing with `StoreError::Duplicate` if the email is taken.
pub async fn insert_user<C>(con: &mut C, user: &StoredUser) -> Result<(), StoreError>
where
    C: AsyncCommands,
{
    let json = Zeroizing::new(serde_json::to_string(user)?);

    let created: i32 = redis::Script::new(CREATE_USER_SCRIPT)
        .key(email_key(&user.email))
        .key(user_key(&user.id))
        .arg(&user.id)
        .arg(json.as_str())
        .invoke_async(con)
        .await?;

    if created == 1 {
        Ok(())
    } else {
        Err(StoreError::Duplicate)
    }
}

/// Credential store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        RedisStore { client }
    }

    /// Open a client for `url`. Does not connect yet.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(RedisStore::new(redis::Client::open(url)?))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis connection error: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let mut con = self.connection().await?;
        get_user_by_email(&mut con, email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        let mut con = self.connection().await?;
        get_user(&mut con, id).await
    }

    async fn create(&self, user: NewUser) -> Result<StoredUser, StoreError> {
        let mut con = self.connection().await?;
        let user = user.into_stored(new_user_id());
        insert_user(&mut con, &user).await?;
        Ok(user)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut con = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(())
    }
}
