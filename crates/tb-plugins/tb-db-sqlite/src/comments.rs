//! `CommentRepo` over the `comments` table.

use crate::SqliteForumRepo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tb_core::error::AppError;
use tb_core::models::Comment;
use tb_core::traits::CommentRepo;
use uuid::Uuid;

const COMMENT_COLUMNS: &str = "id, post_id, parent_id, content, author, created_at, updated_at";

/// Ids of a comment and everything below it.
const SUBTREE_CTE: &str = "WITH RECURSIVE subtree(id) AS (
        SELECT id FROM comments WHERE id = ?
        UNION ALL
        SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
    )";

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        parent_id: row.try_get("parent_id")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comments_from_rows(rows: Vec<SqliteRow>) -> Result<Vec<Comment>, sqlx::Error> {
    rows.iter().map(comment_from_row).collect()
}

impl SqliteForumRepo {
    async fn fetch_comments(&self, filter: &str, key: Uuid, order: &str) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE {filter} ORDER BY created_at {order}, id {order}"
        ))
        .bind(key)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments_from_rows(rows)?)
    }
}

#[async_trait]
impl CommentRepo for SqliteForumRepo {
    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()> {
        let result = sqlx::query(
            "INSERT INTO comments (id, post_id, parent_id, content, author, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(&comment.content)
        .bind(&comment.author)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                let err = match comment.parent_id {
                    Some(parent_id) => AppError::not_found("Comment", parent_id),
                    None => AppError::not_found("Post", comment.post_id),
                };
                Err(err.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(comment_from_row).transpose()?)
    }

    async fn update_comment_content(
        &self,
        id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rows removed by `ON DELETE CASCADE` are not reported by SQLite, so the
    /// subtree is counted first and deleted by id in the same transaction.
    async fn delete_comment_tree(&self, id: Uuid) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;

        let size: i64 = sqlx::query_scalar(&format!("{SUBTREE_CTE} SELECT COUNT(*) FROM subtree"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if size == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        sqlx::query(&format!(
            "{SUBTREE_CTE} DELETE FROM comments WHERE id IN (SELECT id FROM subtree)"
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(size as u64)
    }

    async fn list_top_level_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        self.fetch_comments("post_id = ? AND parent_id IS NULL", post_id, "ASC").await
    }

    async fn list_replies(&self, parent_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        self.fetch_comments("parent_id = ?", parent_id, "ASC").await
    }

    async fn list_replies_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        self.fetch_comments("post_id = ? AND parent_id IS NOT NULL", post_id, "ASC").await
    }

    async fn list_comments_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        self.fetch_comments("post_id = ?", post_id, "ASC").await
    }

    async fn count_comments_for_post(&self, post_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_comments_by_author(&self, author: &str) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE author = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(author)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments_from_rows(rows)?)
    }
}
