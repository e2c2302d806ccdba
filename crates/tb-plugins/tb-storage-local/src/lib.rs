//! # tb-storage-local
//! threadboard/crates/tb-plugins/tb-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: size and extension checks, year/month directory sharding,
//! random file names, best-effort deletion.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tb_config::MediaSettings;
use tb_core::error::AppError;
use tb_core::traits::MediaStore;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./uploads")
    root_path: PathBuf,
    max_file_size: u64,
    /// Lower-case, dot-less
    allowed_extensions: Vec<String>,
}

impl LocalMediaStore {
    pub fn new(settings: &MediaSettings) -> Self {
        Self {
            root_path: settings.upload_dir.clone(),
            max_file_size: settings.max_file_size,
            allowed_extensions: settings.normalized_extensions(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Text after the last dot, lower-cased. `None` when there is no dot.
    fn extension_of(filename: &str) -> Option<String> {
        let (_, ext) = filename.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// `sub_dir` must be one plain path segment such as "posts".
    fn check_sub_dir(sub_dir: &str) -> anyhow::Result<()> {
        let mut components = Path::new(sub_dir).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !sub_dir.contains(['/', '\\']) => Ok(()),
            _ => Err(AppError::ValidationError(format!("invalid upload directory: {sub_dir:?}")).into()),
        }
    }

    /// Maps a web path (`/posts/2024/05/x.png`) back onto the disk.
    /// Returns `None` for anything that could escape the root.
    fn resolve(&self, web_path: &str) -> Option<PathBuf> {
        let relative = web_path.strip_prefix('/').unwrap_or(web_path);
        if relative.is_empty() || relative.contains('\\') {
            return None;
        }
        let mut path = self.root_path.clone();
        for segment in relative.split('/') {
            match Path::new(segment).components().next() {
                Some(Component::Normal(_)) if segment != "." => path.push(segment),
                _ => return None,
            }
        }
        Some(path)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload under `<root>/<sub_dir>/<yyyy>/<MM>/<uuid>.<ext>`.
    async fn save_upload(
        &self,
        data: Vec<u8>,
        original_filename: &str,
        sub_dir: &str,
    ) -> anyhow::Result<Option<String>> {
        if data.is_empty() {
            return Ok(None);
        }

        if data.len() as u64 > self.max_file_size {
            return Err(AppError::ValidationError(format!(
                "file size must not exceed {} bytes",
                self.max_file_size
            ))
            .into());
        }

        let extension = match Self::extension_of(original_filename) {
            Some(ext) if self.allowed_extensions.contains(&ext) => ext,
            _ => {
                return Err(AppError::ValidationError(format!(
                    "file type not allowed (accepted: {})",
                    self.allowed_extensions.join(", ")
                ))
                .into())
            }
        };

        Self::check_sub_dir(sub_dir)?;

        // 1. Ensure the dated directory exists
        let date_path = Utc::now().format("%Y/%m").to_string();
        let mut dir = self.root_path.join(sub_dir);
        dir.extend(date_path.split('/'));
        if fs::metadata(&dir).await.is_err() {
            fs::create_dir_all(&dir).await?;
            tracing::info!(dir = %dir.display(), "created upload directory");
        }

        // 2. Write under a fresh random name
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let target_path = dir.join(&file_name);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target_path)
            .await?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::info!(path = %target_path.display(), bytes = data.len(), "stored upload");
        Ok(Some(format!("/{sub_dir}/{date_path}/{file_name}")))
    }

    async fn delete_upload(&self, path: &str) {
        if path.is_empty() {
            return;
        }

        let Some(target) = self.resolve(path) else {
            tracing::warn!(path, "refusing to delete path outside the upload directory");
            return;
        };

        match fs::remove_file(&target).await {
            Ok(()) => tracing::info!(path = %target.display(), "deleted upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %target.display(), "upload already gone")
            }
            Err(e) => tracing::error!(path = %target.display(), error = %e, "failed to delete upload"),
        }
    }

    fn is_allowed_image(&self, original_filename: &str) -> bool {
        Self::extension_of(original_filename)
            .map(|ext| self.allowed_extensions.contains(&ext))
            .unwrap_or(false)
    }
}
