//! Tick cadence
//!
//! Every tick advances a counter that wraps at the skip count. A tick
//! fetches status when forced polls are pending, or when the counter wraps
//! to zero; otherwise it is skipped.

/// What a tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollDecision {
    /// Pending budget: fetch regardless of phase
    Forced,
    /// Counter wrapped: regular fetch
    Natural,
    Skip,
}

impl PollDecision {
    pub fn fetches(self) -> bool {
        !matches!(self, PollDecision::Skip)
    }
}

/// Skip counter wrapping modulo the skip count
#[derive(Debug, Clone)]
pub struct PollSchedule {
    skip_count: u32,
    counter: u32,
}

impl PollSchedule {
    /// A skip count of 0 is treated as 1 (fetch on every tick)
    pub fn new(skip_count: u32) -> Self {
        Self {
            skip_count: skip_count.max(1),
            counter: 0,
        }
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance one tick
    pub fn tick(&mut self, forced_pending: bool) -> PollDecision {
        self.counter = (self.counter + 1) % self.skip_count;
        if forced_pending {
            PollDecision::Forced
        } else if self.counter == 0 {
            PollDecision::Natural
        } else {
            PollDecision::Skip
        }
    }
}
