//! Account lifecycle: registration, login, password reset, renaming.

use chrono::Utc;
use std::sync::Arc;
use tb_core::error::{AppError, Result};
use tb_core::models::User;
use tb_core::traits::{CredentialHasher, UserRepo};
use tb_core::validation::{validate_display_name, validate_password, validate_username};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepo>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepo>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { users, hasher }
    }

    /// Registers a new account. A username that is already taken, including
    /// one claimed concurrently, yields `DuplicateUsername`.
    pub async fn register(&self, username: &str, password: &str, display_name: &str) -> Result<User> {
        validate_username(username)?;
        validate_password(password)?;
        validate_display_name(display_name)?;

        if self.exists_by_username(username).await? {
            return Err(AppError::DuplicateUsername(username.to_string()));
        }

        let hash = self.hasher.hash_password(password).await?;
        let user = User::new(username, hash, display_name);
        self.users.create_user(user.clone()).await?;

        tracing::info!(user_id = %user.id, username, "user registered");
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.users.find_user_by_username(username).await? else {
            tracing::warn!(username, "login for unknown user");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify_password(password, &user.password_hash).await {
            tracing::warn!(username, "login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        tracing::debug!(user_id = %user.id, "login succeeded");
        Ok(user)
    }

    /// The display name acts as a second factor: both must match the stored record.
    pub async fn reset_password(&self, username: &str, display_name: &str, new_password: &str) -> Result<User> {
        validate_password(new_password)?;

        let mut user = self
            .users
            .find_user_by_username_and_name(username, display_name)
            .await?
            .ok_or_else(|| AppError::not_found("User", username))?;

        user.password_hash = self.hasher.hash_password(new_password).await?;
        user.updated_at = Utc::now();
        self.save(&user).await?;

        tracing::info!(user_id = %user.id, "password reset");
        Ok(user)
    }

    /// Renames the account. Author strings on existing posts and comments keep the old name.
    pub async fn update_display_name(&self, user_id: Uuid, new_name: &str) -> Result<User> {
        validate_display_name(new_name)?;

        let mut user = self.find_by_id(user_id).await?;
        user.name = new_name.to_string();
        user.updated_at = Utc::now();
        self.save(&user).await?;

        tracing::info!(%user_id, "display name changed");
        Ok(user)
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool> {
        Ok(self.users.find_user_by_username(username).await?.is_some())
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", user_id))
    }

    async fn save(&self, user: &User) -> Result<()> {
        if self.users.update_user(user).await? {
            Ok(())
        } else {
            Err(AppError::not_found("User", user.id))
        }
    }
}
