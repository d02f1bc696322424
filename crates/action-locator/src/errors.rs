//! Error types for element resolution

use page_adapter::AdapterError;
use thiserror::Error;

/// Failure of a single lookup attempt.
///
/// Resolution itself never fails: these errors are logged by the polling
/// loop, which keeps polling on retryable ones and gives up on the rest.
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Query string is unusable for its lookup kind
    #[error("Invalid query for {api}: {reason}")]
    InvalidQuery { api: &'static str, reason: String },

    /// Page adapter failure
    #[error("Page error: {0}")]
    Page(#[from] AdapterError),
}

impl LocatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LocatorError::InvalidQuery { .. } => false,
            LocatorError::Page(err) => err.is_retryable(),
        }
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::InvalidQuery { .. } => 1,
            LocatorError::Page(err) if err.is_retryable() => 2,
            LocatorError::Page(_) => 1,
        }
    }
}
