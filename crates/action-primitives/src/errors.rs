//! Error types for step execution

use page_adapter::AdapterError;
use thiserror::Error;

/// Typed failure of one step.
///
/// Execution never panics or aborts a script: every failure comes back as
/// one of these so that playback can move on to the next step.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Step has no command
    #[error("Step has no command")]
    NoCommand,

    /// Stored command type is not known to this build
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Step has no element, or its element resolved to nothing
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Open Link resolved elements but none of them carries an href
    #[error("No valid links among {0} resolved element(s)")]
    NoValidLinks(usize),

    /// Operation was cancelled or interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),

    /// Tab host did not accept the open-links request
    #[error("Tab dispatch failed: {0}")]
    Dispatch(String),

    /// Page adapter failure while acting on an element
    #[error("Page error: {0}")]
    Page(#[from] AdapterError),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ActionError::ElementNotFound(_) => true,
            ActionError::Page(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::UnknownCommand(_) | ActionError::Dispatch(_) => 2,
            ActionError::Page(err) if err.is_retryable() => 2,
            ActionError::ElementNotFound(_)
            | ActionError::NoValidLinks(_)
            | ActionError::NoCommand
            | ActionError::Page(_) => 1,
            ActionError::Interrupted(_) => 0,
        }
    }
}
