//! Step engine error types

use script_store::StoreError;
use thiserror::Error;

/// Editing and saving errors.
///
/// Playback never produces these for a failing step; step failures are
/// carried inside [`crate::StepResult`].
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Step {index} out of range (script has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },

    /// Selection synthesizes to no descriptor at all
    #[error("Selection is empty; pick at least one facet")]
    EmptySelection,

    #[error("Script name cannot be empty")]
    EmptyName,

    /// Some step lacks an element or a command, or has empty input text
    #[error("Script is not executable: {0}")]
    NotExecutable(String),

    #[error("Script store error: {0}")]
    Store(#[from] StoreError),
}
