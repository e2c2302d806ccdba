//! `UserRepo` over the `users` table.

use crate::SqliteForumRepo;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tb_core::error::AppError;
use tb_core::models::User;
use tb_core::traits::UserRepo;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, password_hash, name, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepo for SqliteForumRepo {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateUsername(user.username).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_user_by_username_and_name(
        &self,
        username: &str,
        name: &str,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? AND name = ?"
        ))
        .bind(username)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn update_user(&self, user: &User) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, name = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteForumRepo {
        SqliteForumRepo::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = repo().await;
        let user = User::new("alice", "$argon2id$hash".into(), "Alice");
        repo.create_user(user.clone()).await.unwrap();

        let by_id = repo.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id, user);

        let by_name = repo.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(repo.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_reported_as_domain_error() {
        let repo = repo().await;
        repo.create_user(User::new("alice", "h1".into(), "Alice")).await.unwrap();

        let err = repo.create_user(User::new("alice", "h2".into(), "Other")).await.unwrap_err();
        assert!(matches!(
            err.downcast::<AppError>(),
            Ok(AppError::DuplicateUsername(name)) if name == "alice"
        ));

        let kept = repo.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(kept.password_hash, "h1");
    }

    #[tokio::test]
    async fn test_lookup_by_username_and_name_needs_both() {
        let repo = repo().await;
        repo.create_user(User::new("alice", "h".into(), "Alice")).await.unwrap();

        assert!(repo.find_user_by_username_and_name("alice", "Alice").await.unwrap().is_some());
        assert!(repo.find_user_by_username_and_name("alice", "alice").await.unwrap().is_none());
        assert!(repo.find_user_by_username_and_name("bob", "Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_writes_hash_and_name() {
        let repo = repo().await;
        let mut user = User::new("alice", "old".into(), "Alice");
        repo.create_user(user.clone()).await.unwrap();

        user.password_hash = "new".into();
        user.name = "Al".into();
        user.updated_at = chrono::Utc::now();
        assert!(repo.update_user(&user).await.unwrap());

        let stored = repo.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new");
        assert_eq!(stored.name, "Al");
        assert_eq!(stored.created_at, user.created_at);

        let ghost = User::new("ghost", "x".into(), "Ghost");
        assert!(!repo.update_user(&ghost).await.unwrap());
    }
}
