//! Core data types for step execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Execution context for one step
#[derive(Clone, Debug)]
pub struct ExecCtx {
    /// Cancellation token for cooperative cancellation, shared with the resolver
    pub cancel_token: CancellationToken,

    /// Unique identifier for this action
    pub action_id: String,
}

impl Default for ExecCtx {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl ExecCtx {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            action_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Check if this context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Report of a successful step execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    /// Always true for reports; failures travel as `ActionError`
    pub ok: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    /// Number of elements the command was applied to
    pub matched_elements: usize,

    /// Display name of the executed command
    pub command: String,

    /// URLs handed to the tab host by an Open Link step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opened_links: Vec<String>,
}

impl ActionReport {
    /// Create a successful action report
    pub fn success(
        started_at: DateTime<Utc>,
        latency_ms: u64,
        command: impl Into<String>,
        matched_elements: usize,
    ) -> Self {
        Self {
            ok: true,
            started_at,
            finished_at: Utc::now(),
            latency_ms,
            matched_elements,
            command: command.into(),
            opened_links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.opened_links = links;
        self
    }
}

/// Tab limits forwarded with every open-links request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabSettings {
    pub max_tabs: usize,
    pub close_on_done: bool,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            max_tabs: 5,
            close_on_done: false,
        }
    }
}
