//! Step engine
//!
//! Editing and playback of one webminer script: step CRUD, executability
//! checks, single-step and whole-script playback with a per-step status
//! board, and rename-aware saving.

pub mod engine;
pub mod errors;
pub mod status;
pub mod types;

pub use engine::StepEngine;
pub use errors::FlowError;
pub use status::{StatusBoard, StatusEvent};
pub use types::{FlowResult, PlaybackConfig, StepResult, StepState, StepStatus};
