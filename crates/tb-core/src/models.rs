//! # Domain Models
//!
//! These structs represent the core entities of threadboard.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Login name, unique across the board
    pub username: String,
    /// Argon2 PHC string; never the plaintext
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Display name copied onto posts and comments as the author string
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, password_hash: String, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A top-level entry on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Display name of the writer at the time of posting
    pub author: String,
    /// Web path returned by the `MediaStore` (e.g. `/posts/2024/05/<uuid>.png`)
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: &str, content: &str, author: &str, image_path: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: title.to_string(),
            content: content.to_string(),
            author: author.to_string(),
            image_path,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A comment attached to a post. `parent_id` is `None` for top-level
/// comments and points at a top-level comment of the same post for replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, parent_id: Option<Uuid>, content: &str, author: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            post_id,
            parent_id,
            content: content.to_string(),
            author: author.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// A top-level comment together with its replies, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

impl CommentThread {
    pub fn new(comment: Comment) -> Self {
        Self { comment, replies: Vec::new() }
    }

    /// Number of rows this thread occupies (the comment plus its replies).
    pub fn row_count(&self) -> usize {
        1 + self.replies.len()
    }
}

/// The identity on whose behalf a service call runs.
///
/// Ownership of posts and comments is decided by comparing the caller's
/// display name against the stored author string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    display_name: String,
}

impl Caller {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self { display_name: display_name.into() }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// True when `author` was written by this caller.
    pub fn is_author_of(&self, author: &str) -> bool {
        self.display_name == author
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self::new(user.name.clone())
    }
}

/// Raw bytes of an uploaded file plus the name the client gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub original_filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(original_filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self { original_filename: original_filename.into(), data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
