use thiserror::Error;

use crate::database::DatabaseError;
use crate::policy::PolicyError;

pub const VIDEO_NOT_FOUND: &str = "Video not found";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    /// Blocked and missing videos share this error so callers cannot tell them apart
    pub fn video_not_found() -> Self {
        ServiceError::NotFound(VIDEO_NOT_FOUND.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn no_active_child() -> Self {
        ServiceError::Conflict("No active child profile".to_string())
    }
}
