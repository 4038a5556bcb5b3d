//! ATV Device Control
//!
//! Serialized access to a media device's control interface.
//!
//! # Overview
//!
//! - [`DeviceControlChannel`]: blocking command interface (implemented by
//!   [`AtvRemoteChannel`] and by test fakes)
//! - [`CommandGate`]: one call at a time, bounded wait, drop on timeout
//! - [`GatedChannel`]: channel + device target + gate, with typed commands
//! - [`DeviceEvent`] / [`StatusCallback`]: results flowing back from the device
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use atv_control::CommandGate;
//!
//! let gate = CommandGate::new();
//! let answer = gate.with_exclusive_access(Duration::from_millis(100), || 6 * 7);
//! assert_eq!(answer, Ok(42));
//! ```

pub mod channel;
pub mod client;
pub mod devices;
pub mod error;
pub mod event;
pub mod gate;
pub mod process;

pub use channel::{DeviceControlChannel, DeviceTarget, ExitCode, PAIR_COMMAND, STATUS_COMMAND};
pub use client::{GatedChannel, RepeatMode};
pub use devices::{DiscoveredDevice, DiscoveredDevices};
pub use error::{ControlError, GateError, Result};
pub use event::{spawn_event_pump, DeviceEvent, LogLevel, StatusCallback};
pub use gate::{CommandGate, DEFAULT_GATE_TIMEOUT};
pub use process::{
    pairing_guid, parse_playing_output, AtvRemoteChannel, DEFAULT_COMMAND_TIMEOUT, DEFAULT_EXECUTABLE,
};
