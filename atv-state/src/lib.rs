//! ATV State Mirror
//!
//! Keeps a best-effort copy of what a remote media device is playing and
//! turns raw status reports into channel updates.
//!
//! # Architecture
//!
//! ```text
//! (property, raw value) → StatusEventMapper → ChannelUpdate(s)
//!                              │
//!                              ├── ChannelMap    (property → channel id)
//!                              ├── PlayStatus    (last published values)
//!                              └── PositionState (seconds, clamped)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use atv_state::{ChannelMap, StatusEventMapper};
//!
//! let mut mapper = StatusEventMapper::new(ChannelMap::default());
//!
//! let outcome = mapper.apply("position", "125");
//! assert_eq!(outcome.updates[0].value, "00:02:05");
//!
//! // Same value again: nothing to publish
//! assert!(mapper.apply("position", "125").updates.is_empty());
//! ```
//!
//! Seek requests are resolved with [`position::resolve_position`]:
//!
//! ```rust
//! use atv_state::position::resolve_position;
//!
//! assert_eq!(resolve_position("-150", 100, 500), Ok(0));
//! assert_eq!(resolve_position("50%", 0, 200), Ok(100));
//! ```

pub mod error;
pub mod mapper;
pub mod position;
pub mod property;
pub mod status;

pub use error::{PositionError, Result};
pub use mapper::{ChannelUpdate, MapOutcome, StatusEventMapper, MEDIA_TYPE_MUSIC};
pub use position::{clock_to_seconds, resolve_position, seconds_to_clock};
pub use property::{ChannelMap, PropertyKey, UnknownProperty, GROUP_CONTROL, GROUP_MEDIA, GROUP_STATUS};
pub use status::{PlayStatus, PositionState};
