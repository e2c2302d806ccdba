//! # tb-services
//!
//! Business rules of threadboard. Services take the ports from `tb-core`
//! as `Arc<dyn ...>` so any adapter set can be plugged in, and every
//! mutating call receives the `Caller` it runs on behalf of.

mod comment;
mod post;
mod post_workflow;
mod user;

pub use comment::CommentService;
pub use post::PostService;
pub use post_workflow::{ImageChange, PostWorkflow, IMAGE_SUB_DIR};
pub use user::UserService;

use tb_core::error::{AppError, Result};
use tb_core::models::Caller;
use uuid::Uuid;

/// Rejects the call unless `caller` wrote the entity.
pub(crate) fn ensure_author(caller: &Caller, author: &str, entity: &str, id: Uuid) -> Result<()> {
    if caller.is_author_of(author) {
        return Ok(());
    }
    tracing::warn!(
        entity,
        %id,
        caller = caller.display_name(),
        "rejected write by non-author"
    );
    Err(AppError::Unauthorized(format!(
        "only the author may modify this {}",
        entity.to_lowercase()
    )))
}
