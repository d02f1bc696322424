//! Playback types

use std::time::Duration;

use action_primitives::ActionReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-step display state: `idle → running → success | error → idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    pub state: StepState,
    /// Failure text while in `Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn running() -> Self {
        Self {
            state: StepState::Running,
            message: None,
        }
    }

    pub fn success() -> Self {
        Self {
            state: StepState::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: StepState::Error,
            message: Some(message.into()),
        }
    }
}

/// Playback timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Pause after every step of a full run, successful or not
    pub inter_step_delay_ms: u64,

    /// How long a finished step shows its result before going idle
    pub status_reset_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            inter_step_delay_ms: 1_000,
            status_reset_ms: 3_000,
        }
    }
}

impl PlaybackConfig {
    pub fn inter_step_delay(&self) -> Duration {
        Duration::from_millis(self.inter_step_delay_ms)
    }

    pub fn status_reset(&self) -> Duration {
        Duration::from_millis(self.status_reset_ms)
    }
}

/// Outcome of playing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub success: bool,
    pub report: Option<ActionReport>,
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
    pub latency_ms: u64,
}

impl StepResult {
    pub fn new(index: usize) -> Self {
        let now = Utc::now();
        Self {
            index,
            success: false,
            report: None,
            error: None,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
        }
    }

    pub fn with_report(mut self, report: ActionReport) -> Self {
        self.success = true;
        self.report = Some(report);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Set finish time and calculate latency
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self
    }
}

/// Outcome of playing a whole script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResult {
    pub script: String,
    /// True when every step succeeded
    pub success: bool,
    /// True when playback stopped early on cancellation
    pub cancelled: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
    pub latency_ms: u64,
    pub step_results: Vec<StepResult>,
}

impl FlowResult {
    pub fn new(script: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            script: script.into(),
            success: false,
            cancelled: false,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            step_results: Vec::new(),
        }
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.step_results.iter().filter(|result| !result.success)
    }

    pub fn finish(mut self) -> Self {
        self.success = !self.cancelled && self.step_results.iter().all(|result| result.success);
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self
    }
}
