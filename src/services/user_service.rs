use std::sync::Arc;

use bcrypt::hash;

use crate::database::UserStore;
use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::{uniqueness, validation};
use crate::utils::AppError;

/// User operations shared by the HTTP handlers. The store is injected at
/// startup so handlers never reach for a global connection.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    password_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, password_cost: u32) -> Self {
        Self {
            store,
            password_cost,
        }
    }

    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.store.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// validate → uniqueness check → hash → insert
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<UserResponse, AppError> {
        let candidate = validation::validate_new_user(request)?;

        uniqueness::ensure_identity_available(self.store(), &candidate.identity()).await?;

        let password_hash = self.hash_password(candidate.password.clone()).await?;
        let stored = self.store.insert(candidate.into_user(password_hash)).await?;

        Ok(UserResponse::from(stored))
    }

    pub async fn update_user(
        &self,
        id: &str,
        request: &UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        if let Some(user_id) = &request.user_id {
            log::warn!(
                "⚠️  Ignoring `user_id` ({}) on update of {}: not a user field",
                user_id,
                id
            );
        }

        let mut patch = validation::validate_patch(request)?;
        if let Some(plain) = patch.password.take() {
            patch.password = Some(self.hash_password(plain).await?);
        }

        self.store
            .update_by_id(id, &patch)
            .await?
            .map(UserResponse::from)
            .ok_or_else(AppError::not_found)
    }

    /// bcrypt is CPU-bound, so it runs on the blocking pool instead of
    /// stalling the worker that serves the request.
    async fn hash_password(&self, plain: String) -> Result<String, AppError> {
        let cost = self.password_cost;
        tokio::task::spawn_blocking(move || hash(plain, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(AppError::from)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        match self.store.delete_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found()),
        }
    }
}
