//! Step status board.
//!
//! Keeps one [`StepStatus`] per step and broadcasts every change. Each change
//! gets a fresh generation number; a delayed reset only applies while the
//! slot still carries the generation it was scheduled for, so re-running a
//! step cancels the pending reset of its previous run.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::types::{StepState, StepStatus};

const EVENT_CAPACITY: usize = 64;

/// Status change of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub index: usize,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    status: StepStatus,
    generation: u64,
}

#[derive(Debug, Default)]
struct Slots {
    slots: Vec<Slot>,
    next_generation: u64,
}

impl Slots {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

pub struct StatusBoard {
    inner: Mutex<Slots>,
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusBoard {
    pub fn new(steps: usize) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Slots {
                slots: vec![Slot::default(); steps],
                next_generation: 0,
            }),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<StepStatus> {
        self.inner
            .lock()
            .slots
            .get(index)
            .map(|slot| slot.status.clone())
    }

    pub fn snapshot(&self) -> Vec<StepStatus> {
        self.inner
            .lock()
            .slots
            .iter()
            .map(|slot| slot.status.clone())
            .collect()
    }

    /// Track a new idle step at the end.
    pub fn push(&self) {
        self.inner.lock().slots.push(Slot::default());
    }

    /// Stop tracking `index`; later steps shift down.
    pub fn remove(&self, index: usize) {
        let mut inner = self.inner.lock();
        if index < inner.slots.len() {
            inner.slots.remove(index);
        }
    }

    /// Put `index` back to idle, dropping any pending reset.
    pub fn clear(&self, index: usize) {
        self.set(index, StepStatus::idle());
    }

    /// Change a step's status. Returns the generation of the change, or
    /// `None` when the index is not tracked.
    pub fn set(&self, index: usize, status: StepStatus) -> Option<u64> {
        let generation = {
            let mut inner = self.inner.lock();
            if index >= inner.slots.len() {
                return None;
            }
            let generation = inner.bump();
            inner.slots[index] = Slot {
                status: status.clone(),
                generation,
            };
            generation
        };
        trace!(index, state = ?status.state, generation, "step status changed");
        let _ = self.tx.send(StatusEvent { index, status });
        Some(generation)
    }

    /// Reset to idle whichever step still holds `generation`.
    ///
    /// Returns false when that status was superseded or its step removed.
    pub fn reset_if_current(&self, generation: u64) -> bool {
        let index = {
            let mut inner = self.inner.lock();
            let Some(index) = inner
                .slots
                .iter()
                .position(|slot| slot.generation == generation)
            else {
                return false;
            };
            let next = inner.bump();
            inner.slots[index] = Slot {
                status: StepStatus::idle(),
                generation: next,
            };
            index
        };
        let _ = self.tx.send(StatusEvent {
            index,
            status: StepStatus::idle(),
        });
        true
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .lock()
            .slots
            .iter()
            .any(|slot| slot.status.state == StepState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_broadcasts() {
        let board = StatusBoard::new(2);
        let mut rx = board.subscribe();
        board.set(1, StepStatus::running()).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.index, 1);
        assert_eq!(event.status.state, StepState::Running);
        assert!(board.is_running());
        assert_eq!(board.set(5, StepStatus::running()), None);
    }

    #[test]
    fn test_stale_reset_is_ignored() {
        let board = StatusBoard::new(1);
        let first = board.set(0, StepStatus::error("boom")).unwrap();
        let second = board.set(0, StepStatus::running()).unwrap();

        assert!(!board.reset_if_current(first));
        assert_eq!(board.get(0).unwrap().state, StepState::Running);
        assert!(board.reset_if_current(second));
        assert_eq!(board.get(0).unwrap(), StepStatus::idle());
    }

    #[test]
    fn test_reset_follows_shifted_step() {
        let board = StatusBoard::new(3);
        let generation = board.set(2, StepStatus::success()).unwrap();
        board.remove(0);
        assert_eq!(board.len(), 2);
        assert_eq!(board.get(1).unwrap().state, StepState::Success);

        assert!(board.reset_if_current(generation));
        assert_eq!(board.get(1).unwrap().state, StepState::Idle);
    }

    #[test]
    fn test_reset_after_removal_is_noop() {
        let board = StatusBoard::new(1);
        let generation = board.set(0, StepStatus::success()).unwrap();
        board.remove(0);
        assert!(!board.reset_if_current(generation));
        assert!(board.is_empty());
    }
}
