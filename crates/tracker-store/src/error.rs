//! Error types for the store

use thiserror::Error;

/// Result type alias using the store's error type
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection or query failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested row does not exist (or is not visible to the caller)
    #[error("{0}")]
    NotFound(String),

    /// Input rejected before touching the database
    #[error("{0}")]
    Invalid(String),

    /// A unique constraint or a dependent row blocks the write
    #[error("{0}")]
    Conflict(String),

    /// The row points at a search, camera or detection that does not exist
    #[error("{0}")]
    InvalidReference(String),

    /// JSON metadata could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Database directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Translate constraint violations into caller-facing errors
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str, reference: &str) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(conflict.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::InvalidReference(reference.to_string());
            }
        }
        StoreError::Database(err)
    }
}
