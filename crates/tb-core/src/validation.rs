//! Input validation for user-supplied fields.
//!
//! Lengths are counted in characters, not bytes, to match the column limits
//! of the schema.

use crate::error::{AppError, Result};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const NAME_MAX: usize = 20;
pub const TITLE_MAX: usize = 200;
pub const AUTHOR_MAX: usize = 50;
pub const COMMENT_MAX: usize = 500;

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::ValidationError(msg.into())
}

fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(invalid(format!("{field} must be at most {max} characters long")));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if username.trim().is_empty() {
        return Err(invalid("Username is required"));
    }
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(invalid(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters long"
        )));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<()> {
    require_text("Name", name, NAME_MAX)
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<()> {
    require_text("Title", title, TITLE_MAX)
}

pub fn validate_post_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(invalid("Content is required"));
    }
    Ok(())
}

pub fn validate_author(author: &str) -> Result<()> {
    require_text("Author", author, AUTHOR_MAX)
}

pub fn validate_comment_content(content: &str) -> Result<()> {
    require_text("Comment", content, COMMENT_MAX)
}
