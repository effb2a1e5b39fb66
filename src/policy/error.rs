use thiserror::Error;

use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// Child settings could not be read; never downgraded to "unrestricted"
    #[error("Failed to load child settings: {0}")]
    Store(#[from] DatabaseError),

    #[error("Child {child_id} has an unknown age group '{value}'")]
    InvalidSettings { child_id: String, value: String },
}
