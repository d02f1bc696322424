use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use webminer_core_types::ElementHandle;

/// Failure categories surfaced by page adapters.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("invalid selector")]
    InvalidSelector,
    #[error("stale element handle")]
    StaleHandle,
    #[error("page i/o failure")]
    Io,
    #[error("internal error")]
    Internal,
}

/// Error returned by every [`PageAdapter`](crate::PageAdapter) operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn invalid_selector(selector: &str, reason: impl fmt::Display) -> Self {
        Self::new(AdapterErrorKind::InvalidSelector)
            .with_hint(format!("'{}': {}", selector, reason))
    }

    pub fn stale(handle: ElementHandle) -> Self {
        Self::new(AdapterErrorKind::StaleHandle).with_hint(handle.to_string())
    }

    pub fn io(hint: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Io).with_hint(hint)
    }

    /// Worth another poll: the page may settle. A malformed selector or a
    /// dead handle never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, AdapterErrorKind::Io | AdapterErrorKind::Internal)
    }
}
