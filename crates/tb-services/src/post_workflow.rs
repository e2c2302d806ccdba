//! Post operations that also manage the attached image file.
//!
//! File writes are not part of the database transaction. Every operation
//! orders its steps so a failure can leave an orphaned file on disk but
//! never a post pointing at a missing file.

use crate::post::PostService;
use std::sync::Arc;
use tb_core::error::Result;
use tb_core::models::{Caller, Post, Upload};
use tb_core::traits::MediaStore;
use uuid::Uuid;

/// Upload sub-directory for post images.
pub const IMAGE_SUB_DIR: &str = "posts";

/// What an edit does with the post's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Remove,
    Replace(Upload),
}

#[derive(Clone)]
pub struct PostWorkflow {
    posts: PostService,
    media: Arc<dyn MediaStore>,
}

impl PostWorkflow {
    pub fn new(posts: PostService, media: Arc<dyn MediaStore>) -> Self {
        Self { posts, media }
    }

    async fn store(&self, upload: Upload) -> Result<Option<String>> {
        if upload.is_empty() {
            return Ok(None);
        }
        Ok(self
            .media
            .save_upload(upload.data, &upload.original_filename, IMAGE_SUB_DIR)
            .await?)
    }

    async fn discard(&self, path: Option<&str>) {
        if let Some(path) = path {
            self.media.delete_upload(path).await;
        }
    }

    /// Saves the upload, then creates the post. The file is removed again
    /// if the post cannot be created.
    pub async fn publish(
        &self,
        title: &str,
        content: &str,
        upload: Option<Upload>,
        caller: &Caller,
    ) -> Result<Post> {
        let image_path = match upload {
            Some(upload) => self.store(upload).await?,
            None => None,
        };

        match self.posts.create(title, content, caller, image_path.clone()).await {
            Ok(post) => Ok(post),
            Err(e) => {
                tracing::warn!(error = %e, "post creation failed, discarding upload");
                self.discard(image_path.as_deref()).await;
                Err(e)
            }
        }
    }

    pub async fn edit(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
        change: ImageChange,
        caller: &Caller,
    ) -> Result<Post> {
        // Ownership first: a rejected caller must not touch any file.
        let current = self.posts.find_owned(id, caller).await?;

        match change {
            ImageChange::Keep => self.posts.update(id, title, content, caller).await,
            ImageChange::Remove => {
                let updated = self
                    .posts
                    .update_with_image(id, title, content, None, caller)
                    .await?;
                self.discard(current.image_path.as_deref()).await;
                Ok(updated)
            }
            ImageChange::Replace(upload) => {
                let Some(new_path) = self.store(upload).await? else {
                    return self.posts.update(id, title, content, caller).await;
                };

                let updated = match self
                    .posts
                    .update_with_image(id, title, content, Some(new_path.clone()), caller)
                    .await
                {
                    Ok(post) => post,
                    Err(e) => {
                        self.discard(Some(&new_path)).await;
                        return Err(e);
                    }
                };

                self.discard(current.image_path.as_deref()).await;
                Ok(updated)
            }
        }
    }

    /// Deletes the post with its comments, then its image file.
    pub async fn remove(&self, id: Uuid, caller: &Caller) -> Result<Post> {
        let removed = self.posts.delete(id, caller).await?;
        self.discard(removed.image_path.as_deref()).await;
        Ok(removed)
    }
}
