//! Comment tree management: top-level comments plus one level of replies.

use crate::ensure_author;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tb_core::error::{AppError, Result};
use tb_core::models::{Caller, Comment, CommentThread};
use tb_core::traits::{CommentRepo, PostRepo};
use tb_core::validation::{validate_author, validate_comment_content};
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepo>,
    posts: Arc<dyn PostRepo>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepo>, posts: Arc<dyn PostRepo>) -> Self {
        Self { comments, posts }
    }

    async fn require_post(&self, post_id: Uuid) -> Result<()> {
        if self.posts.post_exists(post_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Post", post_id))
        }
    }

    pub async fn find_comment(&self, comment_id: Uuid) -> Result<Comment> {
        tracing::debug!(%comment_id, "loading comment");
        self.comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))
    }

    pub async fn create_top_level_comment(
        &self,
        post_id: Uuid,
        content: &str,
        caller: &Caller,
    ) -> Result<Comment> {
        validate_comment_content(content)?;
        validate_author(caller.display_name())?;
        self.require_post(post_id).await?;

        let comment = Comment::new(post_id, None, content, caller.display_name());
        self.comments.create_comment(comment.clone()).await?;

        tracing::info!(%post_id, comment_id = %comment.id, author = %comment.author, "comment created");
        Ok(comment)
    }

    /// Persists a reply under `parent_id` and returns it. The parent must be
    /// a top-level comment of the same post.
    pub async fn create_reply(
        &self,
        post_id: Uuid,
        parent_id: Uuid,
        content: &str,
        caller: &Caller,
    ) -> Result<Comment> {
        validate_comment_content(content)?;
        validate_author(caller.display_name())?;
        self.require_post(post_id).await?;

        let parent = self.find_comment(parent_id).await?;
        if parent.post_id != post_id {
            return Err(AppError::ValidationError(
                "parent comment belongs to a different post".to_string(),
            ));
        }
        if parent.is_reply() {
            return Err(AppError::ValidationError(
                "replies can only be attached to top-level comments".to_string(),
            ));
        }

        let reply = Comment::new(post_id, Some(parent.id), content, caller.display_name());
        self.comments.create_comment(reply.clone()).await?;

        tracing::info!(%post_id, %parent_id, comment_id = %reply.id, author = %reply.author, "reply created");
        Ok(reply)
    }

    /// Replaces the content. The comment keeps its post and parent.
    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        new_content: &str,
        caller: &Caller,
    ) -> Result<Comment> {
        let mut comment = self.find_comment(comment_id).await?;
        ensure_author(caller, &comment.author, "Comment", comment_id)?;
        validate_comment_content(new_content)?;

        let now = Utc::now();
        if !self.comments.update_comment_content(comment_id, new_content, now).await? {
            return Err(AppError::not_found("Comment", comment_id));
        }

        comment.content = new_content.to_string();
        comment.updated_at = now;
        tracing::info!(%comment_id, "comment updated");
        Ok(comment)
    }

    /// Removes the comment with all of its replies and returns how many rows went.
    pub async fn delete_comment(&self, comment_id: Uuid, caller: &Caller) -> Result<u64> {
        let comment = self.find_comment(comment_id).await?;
        ensure_author(caller, &comment.author, "Comment", comment_id)?;

        let removed = self.comments.delete_comment_tree(comment_id).await?;
        tracing::info!(%comment_id, post_id = %comment.post_id, removed, "comment deleted");
        Ok(removed)
    }

    pub async fn list_top_level(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self.comments.list_top_level_comments(post_id).await?)
    }

    /// Direct replies to one comment, oldest first.
    pub async fn list_replies(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self.comments.list_replies(parent_id).await?)
    }

    pub async fn list_all_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self.comments.list_comments_for_post(post_id).await?)
    }

    /// Top-level comments of the post, each with its replies. Two queries
    /// regardless of the number of threads.
    pub async fn load_threads(&self, post_id: Uuid) -> Result<Vec<CommentThread>> {
        let top_level = self.comments.list_top_level_comments(post_id).await?;
        let replies = self.comments.list_replies_for_post(post_id).await?;

        let mut by_parent: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for reply in replies {
            if let Some(parent_id) = reply.parent_id {
                by_parent.entry(parent_id).or_default().push(reply);
            }
        }

        Ok(top_level
            .into_iter()
            .map(|comment| {
                let replies = by_parent.remove(&comment.id).unwrap_or_default();
                CommentThread { comment, replies }
            })
            .collect())
    }

    pub async fn count_for_post(&self, post_id: Uuid) -> Result<i64> {
        Ok(self.comments.count_comments_for_post(post_id).await?)
    }

    pub async fn find_by_author(&self, author: &str) -> Result<Vec<Comment>> {
        Ok(self.comments.list_comments_by_author(author).await?)
    }

    pub async fn can_write_comment(&self, post_id: Uuid) -> Result<bool> {
        Ok(self.posts.post_exists(post_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use tb_core::traits::{MockCommentRepo, MockPostRepo};

    fn service(comments: MockCommentRepo, posts: MockPostRepo) -> CommentService {
        CommentService::new(Arc::new(comments), Arc::new(posts))
    }

    fn posts_with(post_id: Uuid, exists: bool) -> MockPostRepo {
        let mut posts = MockPostRepo::new();
        posts
            .expect_post_exists()
            .with(eq(post_id))
            .returning(move |_| Ok(exists));
        posts
    }

    #[tokio::test]
    async fn test_top_level_comment_on_missing_post() {
        let post_id = Uuid::now_v7();
        let mut comments = MockCommentRepo::new();
        comments.expect_create_comment().never();

        let svc = service(comments, posts_with(post_id, false));
        let err = svc
            .create_top_level_comment(post_id, "nice post", &Caller::new("bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(entity, _) if entity == "Post"));
    }

    #[tokio::test]
    async fn test_top_level_comment_uses_caller_as_author() {
        let post_id = Uuid::now_v7();
        let mut comments = MockCommentRepo::new();
        comments
            .expect_create_comment()
            .withf(move |c: &Comment| c.post_id == post_id && c.parent_id.is_none() && c.author == "bob")
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(comments, posts_with(post_id, true));
        let comment = svc
            .create_top_level_comment(post_id, "nice post", &Caller::new("bob"))
            .await
            .unwrap();
        assert!(comment.is_top_level());
        assert_eq!(comment.content, "nice post");
    }

    #[tokio::test]
    async fn test_comment_content_is_validated_before_io() {
        let svc = service(MockCommentRepo::new(), MockPostRepo::new());
        let caller = Caller::new("bob");

        let blank = svc.create_top_level_comment(Uuid::now_v7(), "   ", &caller).await;
        assert!(matches!(blank, Err(AppError::ValidationError(_))));

        let long = "x".repeat(501);
        let too_long = svc.create_top_level_comment(Uuid::now_v7(), &long, &caller).await;
        assert!(matches!(too_long, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_reply_to_comment_of_other_post_is_rejected() {
        let post_id = Uuid::now_v7();
        let parent = Comment::new(Uuid::now_v7(), None, "elsewhere", "carol");
        let parent_id = parent.id;

        let mut comments = MockCommentRepo::new();
        comments
            .expect_get_comment()
            .with(eq(parent_id))
            .returning(move |_| Ok(Some(parent.clone())));
        comments.expect_create_comment().never();

        let svc = service(comments, posts_with(post_id, true));
        let err = svc
            .create_reply(post_id, parent_id, "thanks!", &Caller::new("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("different post")));
    }

    #[tokio::test]
    async fn test_reply_to_reply_is_rejected() {
        let post_id = Uuid::now_v7();
        let nested = Comment::new(post_id, Some(Uuid::now_v7()), "a reply", "carol");
        let nested_id = nested.id;

        let mut comments = MockCommentRepo::new();
        comments
            .expect_get_comment()
            .returning(move |_| Ok(Some(nested.clone())));
        comments.expect_create_comment().never();

        let svc = service(comments, posts_with(post_id, true));
        let err = svc
            .create_reply(post_id, nested_id, "deeper", &Caller::new("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_reply_to_missing_parent() {
        let post_id = Uuid::now_v7();
        let mut comments = MockCommentRepo::new();
        comments.expect_get_comment().returning(|_| Ok(None));

        let svc = service(comments, posts_with(post_id, true));
        let err = svc
            .create_reply(post_id, Uuid::now_v7(), "hi", &Caller::new("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(entity, _) if entity == "Comment"));
    }

    #[tokio::test]
    async fn test_reply_points_at_parent() {
        let post_id = Uuid::now_v7();
        let parent = Comment::new(post_id, None, "nice post", "bob");
        let parent_id = parent.id;

        let mut comments = MockCommentRepo::new();
        comments
            .expect_get_comment()
            .returning(move |_| Ok(Some(parent.clone())));
        comments
            .expect_create_comment()
            .withf(move |c: &Comment| c.parent_id == Some(parent_id))
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(comments, posts_with(post_id, true));
        let reply = svc
            .create_reply(post_id, parent_id, "thanks!", &Caller::new("alice"))
            .await
            .unwrap();
        assert_eq!(reply.parent_id, Some(parent_id));
        assert_eq!(reply.author, "alice");
    }

    #[tokio::test]
    async fn test_update_by_non_author_is_unauthorized() {
        let existing = Comment::new(Uuid::now_v7(), None, "mine", "bob");
        let id = existing.id;

        let mut comments = MockCommentRepo::new();
        comments
            .expect_get_comment()
            .returning(move |_| Ok(Some(existing.clone())));
        comments.expect_update_comment_content().never();

        let svc = service(comments, MockPostRepo::new());
        let err = svc.update_comment(id, "hijacked", &Caller::new("mallory")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_content_only() {
        let existing = Comment::new(Uuid::now_v7(), None, "draft", "bob");
        let id = existing.id;
        let original = existing.clone();

        let mut comments = MockCommentRepo::new();
        comments
            .expect_get_comment()
            .returning(move |_| Ok(Some(existing.clone())));
        comments
            .expect_update_comment_content()
            .withf(move |cid: &Uuid, content: &str, _| *cid == id && content == "final")
            .times(1)
            .returning(|_, _, _| Ok(true));

        let svc = service(comments, MockPostRepo::new());
        let updated = svc.update_comment(id, "final", &Caller::new("bob")).await.unwrap();
        assert_eq!(updated.content, "final");
        assert_eq!(updated.parent_id, original.parent_id);
        assert_eq!(updated.post_id, original.post_id);
        assert!(updated.updated_at >= original.updated_at);
    }

    #[tokio::test]
    async fn test_delete_reports_removed_rows() {
        let existing = Comment::new(Uuid::now_v7(), None, "top", "bob");
        let id = existing.id;

        let mut comments = MockCommentRepo::new();
        comments
            .expect_get_comment()
            .returning(move |_| Ok(Some(existing.clone())));
        comments
            .expect_delete_comment_tree()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(3));

        let svc = service(comments, MockPostRepo::new());
        assert_eq!(svc.delete_comment(id, &Caller::new("bob")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_comment() {
        let mut comments = MockCommentRepo::new();
        comments.expect_get_comment().returning(|_| Ok(None));
        comments.expect_delete_comment_tree().never();

        let svc = service(comments, MockPostRepo::new());
        let err = svc.delete_comment(Uuid::now_v7(), &Caller::new("bob")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn test_load_threads_groups_replies_under_parents() {
        let post_id = Uuid::now_v7();
        let first = Comment::new(post_id, None, "first", "bob");
        let second = Comment::new(post_id, None, "second", "carol");
        let r1 = Comment::new(post_id, Some(first.id), "r1", "alice");
        let r2 = Comment::new(post_id, Some(first.id), "r2", "carol");

        let tops = vec![first.clone(), second.clone()];
        let replies = vec![r1.clone(), r2.clone()];

        let mut comments = MockCommentRepo::new();
        comments
            .expect_list_top_level_comments()
            .times(1)
            .returning(move |_| Ok(tops.clone()));
        comments
            .expect_list_replies_for_post()
            .times(1)
            .returning(move |_| Ok(replies.clone()));

        let svc = service(comments, MockPostRepo::new());
        let threads = svc.load_threads(post_id).await.unwrap();

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment, first);
        assert_eq!(threads[0].replies, vec![r1, r2]);
        assert_eq!(threads[1].comment, second);
        assert!(threads[1].replies.is_empty());
    }

    #[tokio::test]
    async fn test_list_replies_of_one_comment() {
        let post_id = Uuid::now_v7();
        let parent = Comment::new(post_id, None, "top", "bob");
        let reply = Comment::new(post_id, Some(parent.id), "re", "alice");
        let parent_id = parent.id;
        let listed = vec![reply.clone()];

        let mut comments = MockCommentRepo::new();
        comments
            .expect_list_replies()
            .with(eq(parent_id))
            .times(1)
            .returning(move |_| Ok(listed.clone()));

        let svc = service(comments, MockPostRepo::new());
        assert_eq!(svc.list_replies(parent_id).await.unwrap(), vec![reply]);
    }

    #[tokio::test]
    async fn test_repo_failure_becomes_internal() {
        let mut posts = MockPostRepo::new();
        posts
            .expect_post_exists()
            .returning(|_| Err(anyhow::anyhow!("database is locked")));

        let svc = service(MockCommentRepo::new(), posts);
        let err = svc.can_write_comment(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(msg) if msg.contains("locked")));
    }
}
