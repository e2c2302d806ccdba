//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the services.
//! Adapters report failures through `anyhow`; a domain failure detected
//! inside an adapter (e.g. a unique violation) is raised as an `AppError`
//! wrapped in `anyhow` so the services can recover it.

use crate::models::{Comment, Post, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Persistence contract for user accounts.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a new account. A taken username yields `AppError::DuplicateUsername`.
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_username_and_name(
        &self,
        username: &str,
        name: &str,
    ) -> anyhow::Result<Option<User>>;
    /// Writes password hash, name and `updated_at`. Returns false if the row is gone.
    async fn update_user(&self, user: &User) -> anyhow::Result<bool>;
}

/// Persistence contract for posts.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn create_post(&self, post: Post) -> anyhow::Result<()>;
    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn post_exists(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Writes title, content, image path and `updated_at` in one statement.
    async fn update_post(&self, post: &Post) -> anyhow::Result<bool>;
    /// Removes the post together with all of its comments.
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Newest first.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;
    /// Case-insensitive substring match on the title, newest first.
    async fn search_posts_by_title(&self, needle: &str) -> anyhow::Result<Vec<Post>>;
    /// Exact match on the author string, newest first.
    async fn list_posts_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>>;
}

/// Persistence contract for the two-level comment tree.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()>;
    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn update_comment_content(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    /// Deletes the comment and every reply below it. Returns the number of rows removed.
    async fn delete_comment_tree(&self, id: Uuid) -> anyhow::Result<u64>;

    /// Comments without a parent, oldest first.
    async fn list_top_level_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    /// Direct replies to `parent_id`, oldest first.
    async fn list_replies(&self, parent_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    /// Every reply on the post, oldest first.
    async fn list_replies_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    /// Top-level comments and replies, oldest first.
    async fn list_comments_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn count_comments_for_post(&self, post_id: Uuid) -> anyhow::Result<i64>;
    /// Newest first.
    async fn list_comments_by_author(&self, author: &str) -> anyhow::Result<Vec<Comment>>;
}

/// Media storage contract for uploaded images.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the bytes under `sub_dir` and returns the web path for the Post model.
    /// Empty input stores nothing and yields `None`. Oversized files and
    /// disallowed extensions yield `AppError::ValidationError`.
    async fn save_upload(
        &self,
        data: Vec<u8>,
        original_filename: &str,
        sub_dir: &str,
    ) -> anyhow::Result<Option<String>>;

    /// Best-effort removal of a previously returned path. Never fails.
    async fn delete_upload(&self, path: &str);

    /// Whether the filename carries an accepted image extension.
    fn is_allowed_image(&self, original_filename: &str) -> bool;
}

/// One-way salted password hashing.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Produces a self-describing hash string (salt included).
    async fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a plaintext password against a stored hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;
}
