use std::sync::Arc;

use tracing::debug;

use super::error::{StoreError, UserError};
use super::repo::UserStore;
use super::repo_types::{NewUser, User, UserChanges};

/// Business rules over a [`UserStore`]. Username and email uniqueness is
/// checked here, before the store is asked to insert.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, candidate: NewUser) -> Result<User, UserError> {
        if is_taken(self.store.get_by_username(&candidate.username).await)? {
            debug!(username = %candidate.username, "username taken");
            return Err(UserError::DuplicateUsername);
        }
        if is_taken(self.store.get_by_email(&candidate.email).await)? {
            debug!(email = %candidate.email, "email taken");
            return Err(UserError::DuplicateEmail);
        }
        Ok(self.store.create(candidate).await?)
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.get_all().await?)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, UserError> {
        Ok(self.store.get_by_id(id).await?)
    }

    pub async fn update_user_by_id(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<User, UserError> {
        Ok(self.store.update_by_id(id, changes).await?)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), UserError> {
        Ok(self.store.delete_by_id(id).await?)
    }
}

/// A lookup hit means taken; `NotFound` means free. Anything else is a real
/// storage failure and is passed through unchanged.
fn is_taken(lookup: Result<User, StoreError>) -> Result<bool, UserError> {
    match lookup {
        Ok(_) => Ok(true),
        Err(StoreError::NotFound) => Ok(false),
        Err(e) => Err(UserError::Store(e)),
    }
}
