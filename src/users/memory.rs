use std::collections::BTreeMap;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo::{StoreError, UserStore};
use super::repo_types::User;

/// `UserStore` kept in a map, used by tests in place of Postgres.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            refresh_token: None,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.refresh_token.as_deref() == Some(token))
            .cloned())
    }

    async fn update_refresh_token(
        &self,
        id: i64,
        token: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&id).map(|u| {
            u.refresh_token = token.map(str::to_string);
            u.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_increasing_ids_and_rejects_duplicates() {
        let store = MemoryUserStore::new();
        let a = store.create("a@x.com", "h").await.unwrap();
        let b = store.create("b@x.com", "h").await.unwrap();
        assert!(b.id > a.id);
        assert!(matches!(
            store.create("a@x.com", "h2").await,
            Err(StoreError::DuplicateEmail)
        ));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn refresh_token_lookup_follows_updates() {
        let store = MemoryUserStore::new();
        let user = store.create("a@x.com", "h").await.unwrap();
        assert!(store.find_by_refresh_token("t1").await.unwrap().is_none());

        store.update_refresh_token(user.id, Some("t1")).await.unwrap();
        let found = store.find_by_refresh_token("t1").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        store.update_refresh_token(user.id, None).await.unwrap();
        assert!(store.find_by_refresh_token("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unknown_id_returns_none() {
        let store = MemoryUserStore::new();
        assert!(store.update_refresh_token(42, Some("t")).await.unwrap().is_none());
    }
}
