//! Outbound port to the tab host.
//!
//! Opening tabs is someone else's job: an Open Link step only builds an
//! [`OpenLinksRequest`] and hands it over without waiting for the tabs.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::info;
use webminer_core_types::OpenLinksRequest;

use crate::errors::ActionError;

/// Fire-and-forget sink for open-links requests.
pub trait TabDispatcher: Send + Sync {
    fn dispatch(&self, request: OpenLinksRequest) -> Result<(), ActionError>;
}

/// Forwards requests to whoever holds the receiving end.
#[derive(Debug, Clone)]
pub struct ChannelTabDispatcher {
    tx: mpsc::UnboundedSender<OpenLinksRequest>,
}

impl ChannelTabDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OpenLinksRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TabDispatcher for ChannelTabDispatcher {
    fn dispatch(&self, request: OpenLinksRequest) -> Result<(), ActionError> {
        self.tx
            .send(request)
            .map_err(|_| ActionError::Dispatch("tab host receiver dropped".to_string()))
    }
}

/// Logs requests and keeps the most recent ones for later inspection.
#[derive(Debug)]
pub struct LoggingTabDispatcher {
    sent: Mutex<VecDeque<OpenLinksRequest>>,
    capacity: usize,
}

impl Default for LoggingTabDispatcher {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl LoggingTabDispatcher {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` requests; older ones are dropped first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sent: Mutex::new(VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY))),
            capacity,
        }
    }

    /// Retained requests, oldest first.
    pub fn requests(&self) -> Vec<OpenLinksRequest> {
        self.sent.lock().iter().cloned().collect()
    }
}

impl TabDispatcher for LoggingTabDispatcher {
    fn dispatch(&self, request: OpenLinksRequest) -> Result<(), ActionError> {
        info!(
            links = request.link_urls.len(),
            max_tabs = request.max_tabs,
            close_on_done = request.close_on_done,
            script = ?request.script_name,
            "Open links requested"
        );
        if self.capacity == 0 {
            return Ok(());
        }
        let mut sent = self.sent.lock();
        while sent.len() >= self.capacity {
            sent.pop_front();
        }
        sent.push_back(request);
        Ok(())
    }
}
