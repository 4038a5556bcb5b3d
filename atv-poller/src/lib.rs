//! ATV Status Poller
//!
//! Keeps the mirrored playback state fresh by asking the device for its
//! status on a fixed tick, with an adaptive rate:
//!
//! - normally one fetch every `skip_count` ticks
//! - after user commands and play state changes, a burst of forced fetches
//!   on consecutive ticks (the [`PendingUpdateBudget`])
//!
//! # Example
//!
//! ```rust
//! use atv_poller::{PollDecision, PollSchedule};
//!
//! let mut schedule = PollSchedule::new(3);
//! assert_eq!(schedule.tick(false), PollDecision::Skip);
//! assert_eq!(schedule.tick(true), PollDecision::Forced);
//! assert_eq!(schedule.tick(false), PollDecision::Natural);
//! ```

pub mod budget;
pub mod config;
pub mod error;
pub mod poller;
pub mod schedule;

pub use budget::PendingUpdateBudget;
pub use config::PollerConfig;
pub use error::{PollError, PollResult};
pub use poller::{PollCycle, PollStats, StatusFetch, StatusPoller, TickOutcome};
pub use schedule::{PollDecision, PollSchedule};
