//! `PostRepo` over the `posts` table.

use crate::{like_escape, SqliteForumRepo};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tb_core::models::Post;
use tb_core::traits::PostRepo;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, title, content, author, image_path, created_at, updated_at";

fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        image_path: row.try_get("image_path")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Case-folded copy of a title or search needle. SQLite's `LIKE` only folds
/// ASCII, so both sides are lowered here with full Unicode rules.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn posts_from_rows(rows: Vec<SqliteRow>) -> Result<Vec<Post>, sqlx::Error> {
    rows.iter().map(post_from_row).collect()
}

#[async_trait]
impl PostRepo for SqliteForumRepo {
    async fn create_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO posts (id, title, title_folded, content, author, image_path, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(post.id)
            .bind(&post.title)
            .bind(fold(&post.title))
            .bind(&post.content)
            .bind(&post.author)
            .bind(&post.image_path)
            .bind(post.created_at)
            .bind(post.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(post_from_row).transpose()?)
    }

    async fn post_exists(&self, id: Uuid) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn update_post(&self, post: &Post) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, title_folded = ?, content = ?, image_path = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&post.title)
        .bind(fold(&post.title))
        .bind(&post.content)
        .bind(&post.image_path)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Comments go first inside the same transaction, so the post never
    /// disappears while its comments survive.
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let comments = sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let post = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(post_id = %id, comments = comments.rows_affected(), "post rows deleted");
        Ok(post.rows_affected() > 0)
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts_from_rows(rows)?)
    }

    async fn search_posts_by_title(&self, needle: &str) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE title_folded LIKE '%' || ? || '%' ESCAPE '\\' ORDER BY created_at DESC, id DESC"
        ))
        .bind(like_escape(&fold(needle)))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts_from_rows(rows)?)
    }

    async fn list_posts_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(author)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts_from_rows(rows)?)
    }
}
