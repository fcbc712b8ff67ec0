use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{StoreError, UniqueField};
use super::repo::UserStore;
use super::repo_types::{NewUser, User, UserChanges};

/// In-process [`UserStore`] that behaves like the `users` table with its
/// UNIQUE constraints in place.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Inner {
    fn conflict(&self, skip_id: Option<i64>, username: &str, email: &str) -> Option<UniqueField> {
        let others = self.rows.values().filter(|u| Some(u.id) != skip_id);
        for u in others {
            if u.username == username {
                return Some(UniqueField::Username);
            }
            if u.email == email {
                return Some(UniqueField::Email);
            }
        }
        None
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(field) = inner.conflict(None, &user.username, &user.email) {
            return Err(StoreError::Duplicate(field));
        }
        inner.next_id += 1;
        let row = User {
            id: inner.next_id,
            username: user.username,
            email: user.email,
            age: user.age,
            created_at: user.created_at,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        inner.rows.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_by_username(&self, username: &str) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        inner
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        inner
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().cloned().collect())
    }

    async fn update_by_id(&self, id: i64, changes: UserChanges) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner.rows.get(&id).ok_or(StoreError::NotFound)?;
        let email = changes.email.unwrap_or_else(|| current.email.clone());
        if let Some(field) = inner.conflict(Some(id), &changes.username, &email) {
            return Err(StoreError::Duplicate(field));
        }

        let row = inner.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.username = changes.username;
        row.email = email;
        row.age = changes.age;
        Ok(row.clone())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            age: Some(30),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("alice", "a@example.com")).await.unwrap();
        let b = store.create(new_user("bob", "b@example.com")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn unique_columns_are_enforced() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@example.com")).await.unwrap();

        let err = store
            .create(new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Username)));

        let err = store
            .create(new_user("alice2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_keeps_email_when_absent_and_may_keep_own_username() {
        let store = MemoryUserStore::new();
        let alice = store.create(new_user("alice", "a@example.com")).await.unwrap();

        let updated = store
            .update_by_id(
                alice.id,
                UserChanges {
                    username: "alice".into(),
                    email: None,
                    age: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "a@example.com");
        assert_eq!(updated.age, None);
        assert_eq!(updated.created_at, alice.created_at);
    }

    #[tokio::test]
    async fn update_cannot_take_another_users_username_or_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@example.com")).await.unwrap();
        let bob = store.create(new_user("bob", "b@example.com")).await.unwrap();

        let err = store
            .update_by_id(
                bob.id,
                UserChanges {
                    username: "alice".into(),
                    email: None,
                    age: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Username)));

        let err = store
            .update_by_id(
                bob.id,
                UserChanges {
                    username: "bob".into(),
                    email: Some("a@example.com".into()),
                    age: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));

        assert_eq!(store.get_by_id(bob.id).await.unwrap(), bob);
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        let store = MemoryUserStore::new();
        assert!(matches!(store.get_by_id(1).await, Err(StoreError::NotFound)));
        assert!(matches!(store.delete_by_id(1).await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.get_by_email("x@example.com").await,
            Err(StoreError::NotFound)
        ));
        assert!(store.is_empty().await);
    }
}
