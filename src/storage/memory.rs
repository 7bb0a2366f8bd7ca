//! In-process credential store.
//!
//! Records live in a `HashMap` keyed by email, with an id-to-email index,
//! both behind one `tokio::sync::RwLock`. The existence check and both inserts
//! in `create` happen under one write guard, which gives the same uniqueness
//! guarantee as the Redis script.

use super::{new_user_id, CredentialStore, StoreError};
use crate::models::{NewUser, StoredUser};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Users {
    by_email: HashMap<String, StoredUser>,
    email_by_id: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Users>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.by_email.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.users.read().await.by_email.get(email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .email_by_id
            .get(id)
            .and_then(|email| users.by_email.get(email))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<StoredUser, StoreError> {
        let mut users = self.users.write().await;
        if users.by_email.contains_key(&user.email) {
            return Err(StoreError::Duplicate);
        }
        let user = user.into_stored(new_user_id());
        users
            .email_by_id
            .insert(user.id.clone(), user.email.clone());
        users.by_email.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            fullname: "Jane Doe".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_finds() {
        let store = MemoryStore::new();
        let user = store.create(new_user("jane@x.com")).await.unwrap();
        assert_eq!(user.id.len(), 16);

        let found = store.find_by_email("jane@x.com").await.unwrap().unwrap();
        assert_eq!(found, user);
        let found = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(found, user);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_id_among_many() {
        let store = MemoryStore::new();
        let mut created = Vec::new();
        for i in 0..50 {
            created.push(store.create(new_user(&format!("user{}@x.com", i))).await.unwrap());
        }

        for user in &created {
            let found = store.find_by_id(&user.id).await.unwrap().unwrap();
            assert_eq!(&found, user);
        }

        // A rejected duplicate adds nothing to the id index
        assert!(store.create(new_user("user0@x.com")).await.is_err());
        assert_eq!(store.users.read().await.email_by_id.len(), 50);
    }

    #[tokio::test]
    async fn test_email_is_case_sensitive() {
        let store = MemoryStore::new();
        store.create(new_user("jane@x.com")).await.unwrap();

        assert!(store.find_by_email("JANE@x.com").await.unwrap().is_none());
        // A differently-cased email is a distinct identity
        store.create(new_user("JANE@x.com")).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_without_overwrite() {
        let store = MemoryStore::new();
        let first = store.create(new_user("jane@x.com")).await.unwrap();

        let mut again = new_user("jane@x.com");
        again.fullname = "Impostor".to_string();
        assert!(matches!(
            store.create(again).await,
            Err(StoreError::Duplicate)
        ));

        let found = store.find_by_email("jane@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.fullname, "Jane Doe");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_create_single_winner() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(new_user("race@x.com")).await
            }));
        }

        let mut ok = 0;
        let mut dup = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(StoreError::Duplicate) => dup += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(dup, 15);
        assert_eq!(store.len().await, 1);
    }
}
