//! Pending forced-poll budget

use std::sync::atomic::{AtomicU32, Ordering};

/// Number of forced polls still owed
///
/// Shared between the session (which adds to it after commands and play
/// state changes) and the poller (which consumes it). Never goes below zero.
#[derive(Debug, Default)]
pub struct PendingUpdateBudget {
    pending: AtomicU32,
}

impl PendingUpdateBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add forced polls, saturating at `u32::MAX`
    pub fn add(&self, count: u32) {
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_add(count))
            });
    }

    pub fn pending(&self) -> u32 {
        self.pending.load(Ordering::Acquire)
    }

    pub fn has_pending(&self) -> bool {
        self.pending() > 0
    }

    /// Take one forced poll; returns false if nothing was pending
    pub fn consume_one(&self) -> bool {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}
