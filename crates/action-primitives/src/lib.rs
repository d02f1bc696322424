//! Step execution for webminer
//!
//! Resolves a step's element through an [`action_locator::ElementResolver`]
//! and applies the step's command to every resolved element:
//! - Click
//! - Input Text (value assignment plus `input`/`change` events)
//! - Open Link (handed to an external tab host through [`TabDispatcher`])

pub mod dispatch;
pub mod errors;
pub mod executor;
pub mod primitives;
pub mod types;

pub use dispatch::{ChannelTabDispatcher, LoggingTabDispatcher, TabDispatcher};
pub use errors::ActionError;
pub use executor::{ActionExecutor, DefaultActionExecutor};
pub use types::{ActionReport, ExecCtx, TabSettings};
