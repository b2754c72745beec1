use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tessera_models::User;
use tokio::sync::RwLock;

use crate::repository::{
    CreateUserParams, RepositoryError, UserRepository, password_never_changed,
};

/// Process-local store keyed by email.
#[derive(Debug)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, params: CreateUserParams) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&params.email) {
            return Err(RepositoryError::AlreadyExists);
        }

        let user = User {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: params.name,
            email: params.email,
            role: params.role,
            hashed_password: params.hashed_password,
            password_changed_at: password_never_changed(),
            created_at: Utc::now(),
        };
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<User, RepositoryError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        self.users
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_user_name(&self, email: &str, name: &str) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(email).ok_or(RepositoryError::NotFound)?;
        user.name = name.to_string();
        Ok(user.clone())
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<(), RepositoryError> {
        self.users
            .write()
            .await
            .remove(email)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}
