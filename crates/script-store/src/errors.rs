//! Error types for script storage

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another script already uses this name
    #[error("Script already exists: {0}")]
    NameConflict(String),

    #[error("Script name cannot be empty")]
    EmptyName,

    #[error("Script not found: {0}")]
    NotFound(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}
