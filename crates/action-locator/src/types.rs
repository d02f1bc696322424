//! Core types for the resolver

use std::time::Duration;

use serde::{Deserialize, Serialize};
use webminer_core_types::{ElementHandle, QueryDescriptor};

/// Polling parameters shared by every descriptor of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Delay between two lookups of the same descriptor
    pub poll_interval_ms: u64,

    /// Window after which an unmatched descriptor gives up
    pub timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            timeout_ms: 5_000,
        }
    }
}

impl ResolverConfig {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval_ms: poll_interval.as_millis() as u64,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// How polling of one descriptor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollEnd {
    /// At least one element matched
    Matched,
    /// Timeout elapsed with no match
    TimedOut,
    /// A non-retryable lookup error ended polling early
    Failed,
    /// The cancellation token fired
    Cancelled,
}

/// Outcome of polling one descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorOutcome {
    pub descriptor: QueryDescriptor,
    pub matches: Vec<ElementHandle>,
    pub end: PollEnd,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

/// Full account of one resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Intersection of every descriptor's matches, in the first descriptor's order
    pub elements: Vec<ElementHandle>,
    pub descriptors: Vec<DescriptorOutcome>,
    pub elapsed_ms: u64,
}

impl ResolutionReport {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.descriptors
            .iter()
            .any(|outcome| outcome.end == PollEnd::Cancelled)
    }

    /// Descriptors that ended without matching anything.
    pub fn unmatched(&self) -> impl Iterator<Item = &DescriptorOutcome> {
        self.descriptors
            .iter()
            .filter(|outcome| outcome.matches.is_empty())
    }
}
