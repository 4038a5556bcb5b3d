//! Poller configuration

use std::time::Duration;

use crate::error::{PollError, PollResult};

/// Timing and cadence of the status poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between ticks
    /// Default: 1 second
    pub interval: Duration,

    /// A natural fetch happens every `skip_count` ticks
    /// Default: 5
    pub skip_count: u32,

    /// Forced fetches added after a user command or refresh request
    /// Default: 3
    pub force_burst: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            skip_count: 5,
            force_burst: 3,
        }
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> PollResult<()> {
        if self.interval.is_zero() {
            return Err(PollError::Configuration(
                "Poll interval must be greater than 0".to_string(),
            ));
        }
        if self.skip_count == 0 {
            return Err(PollError::Configuration(
                "Skip count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
