//! # AppError
//!
//! Centralized error handling for threadboard.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Post, Comment, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., comment too long, invalid file type, cross-post reply)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Registration with a username that is already taken
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    /// Unknown username or wrong password
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Caller is not allowed to touch the resource (e.g., not the author)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }
}

/// Ports report failures through `anyhow`. An `AppError` raised inside an
/// adapter is recovered as-is; anything else is an infrastructure failure.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::Internal(format!("{other:#}")),
        }
    }
}

/// A specialized Result type for threadboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
