//! Shared fixtures: every service wired to the real adapters, backed by an
//! in-memory SQLite database and a throw-away upload directory.

use std::path::PathBuf;
use std::sync::Arc;
use tb_auth_argon2::Argon2Hasher;
use tb_config::Settings;
use tb_db_sqlite::SqliteForumRepo;
use tb_services::{CommentService, PostService, PostWorkflow, UserService};
use tb_storage_local::LocalMediaStore;
use tempfile::TempDir;

pub struct TestBoard {
    pub repo: SqliteForumRepo,
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    pub workflow: PostWorkflow,
    pub media: Arc<LocalMediaStore>,
    // Removed with the board.
    upload_dir: TempDir,
}

impl TestBoard {
    pub async fn new() -> anyhow::Result<Self> {
        let upload_dir = TempDir::new()?;

        let settings = Settings::from_builder(
            Settings::defaults()?
                .set_override("database.url", "sqlite::memory:")?
                .set_override("media.upload_dir", upload_dir.path().to_string_lossy().into_owned())?,
        )?;

        let repo = SqliteForumRepo::connect(&settings.database).await?;
        let media = Arc::new(LocalMediaStore::new(&settings.media));

        let users = UserService::new(Arc::new(repo.clone()), Arc::new(Argon2Hasher::new()));
        let posts = PostService::new(Arc::new(repo.clone()));
        let comments = CommentService::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        let workflow = PostWorkflow::new(posts.clone(), media.clone());

        Ok(Self { repo, users, posts, comments, workflow, media, upload_dir })
    }

    /// Maps a web path returned by the media store onto the disk.
    pub fn file_for(&self, web_path: &str) -> PathBuf {
        self.upload_dir.path().join(web_path.trim_start_matches('/'))
    }
}
