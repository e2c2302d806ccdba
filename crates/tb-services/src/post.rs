//! Post lifecycle: create, edit, delete and the listing queries.

use crate::ensure_author;
use chrono::Utc;
use std::sync::Arc;
use tb_core::error::{AppError, Result};
use tb_core::models::{Caller, Post};
use tb_core::traits::PostRepo;
use tb_core::validation::{validate_author, validate_post_content, validate_title};
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepo>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepo>) -> Self {
        Self { posts }
    }

    /// Creates a post authored by `caller`. `image_path` is a path already
    /// returned by the media store.
    pub async fn create(
        &self,
        title: &str,
        content: &str,
        caller: &Caller,
        image_path: Option<String>,
    ) -> Result<Post> {
        validate_title(title)?;
        validate_post_content(content)?;
        validate_author(caller.display_name())?;

        let post = Post::new(title, content, caller.display_name(), image_path);
        self.posts.create_post(post.clone()).await?;

        tracing::info!(post_id = %post.id, author = %post.author, has_image = post.image_path.is_some(), "post created");
        Ok(post)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Post> {
        tracing::debug!(post_id = %id, "loading post");
        self.posts
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", id))
    }

    /// Loads the post and checks that `caller` may modify it.
    pub async fn find_owned(&self, id: Uuid, caller: &Caller) -> Result<Post> {
        let post = self.find_by_id(id).await?;
        ensure_author(caller, &post.author, "Post", id)?;
        Ok(post)
    }

    /// Edits title and content; the image stays as it is.
    pub async fn update(&self, id: Uuid, title: &str, content: &str, caller: &Caller) -> Result<Post> {
        let post = self.find_owned(id, caller).await?;
        let image_path = post.image_path.clone();
        self.write(post, title, content, image_path).await
    }

    /// Edits title, content and image path in one write. `None` clears the image.
    pub async fn update_with_image(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
        image_path: Option<String>,
        caller: &Caller,
    ) -> Result<Post> {
        let post = self.find_owned(id, caller).await?;
        self.write(post, title, content, image_path).await
    }

    async fn write(
        &self,
        mut post: Post,
        title: &str,
        content: &str,
        image_path: Option<String>,
    ) -> Result<Post> {
        validate_title(title)?;
        validate_post_content(content)?;

        post.title = title.to_string();
        post.content = content.to_string();
        post.image_path = image_path;
        post.updated_at = Utc::now();

        if !self.posts.update_post(&post).await? {
            return Err(AppError::not_found("Post", post.id));
        }

        tracing::info!(post_id = %post.id, "post updated");
        Ok(post)
    }

    /// Deletes the post and its comments. The removed post is handed back
    /// so the caller can clean up its image.
    pub async fn delete(&self, id: Uuid, caller: &Caller) -> Result<Post> {
        let post = self.find_owned(id, caller).await?;

        if !self.posts.delete_post(id).await? {
            return Err(AppError::not_found("Post", id));
        }

        tracing::info!(post_id = %id, "post deleted");
        Ok(post)
    }

    pub async fn list_all(&self) -> Result<Vec<Post>> {
        Ok(self.posts.list_posts().await?)
    }

    pub async fn search_by_title(&self, needle: &str) -> Result<Vec<Post>> {
        Ok(self.posts.search_posts_by_title(needle).await?)
    }

    pub async fn find_by_author(&self, author: &str) -> Result<Vec<Post>> {
        Ok(self.posts.list_posts_by_author(author).await?)
    }
}
