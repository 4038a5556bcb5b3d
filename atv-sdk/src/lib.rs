//! ATV SDK
//!
//! Mirrors what an Apple TV is playing and forwards remote control commands
//! to it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::{mpsc, Arc};
//! use atv_sdk::{AtvRemoteChannel, DeviceSession, SessionConfig, TracingSink};
//!
//! let config = SessionConfig::load("appletv.json")?;
//! let (events_tx, events_rx) = mpsc::channel();
//! let channel = Arc::new(
//!     AtvRemoteChannel::new(&config.executable, events_tx)
//!         .with_command_timeout(config.command_timeout()),
//! );
//!
//! let session = Arc::new(DeviceSession::new(config, channel, Arc::new(TracingSink))?);
//! session.spawn_event_pump(events_rx);
//! session.start()?;
//!
//! session.handle_command("control#remoteKey", "select")?;
//! session.handle_command("playStatus#position", "+30")?;
//! ```
//!
//! # Crates
//!
//! - `atv_state`: position arithmetic and the status-to-channel mapper
//! - `atv_control`: the control channel, command gate and device events
//! - `atv_poller`: adaptive status polling

pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod sink;

pub use command::{ChannelCommand, CHANNEL_KEYS_SEQUENCE, CHANNEL_REMOTE_KEY, REFRESH};
pub use config::SessionConfig;
pub use error::{Result, SdkError};
pub use session::{DeviceSession, PairingOutcome};
pub use sink::{ChannelStateSink, TracingSink};

pub use atv_control::{
    AtvRemoteChannel, DeviceControlChannel, DeviceEvent, DiscoveredDevice, DiscoveredDevices,
    ExitCode, LogLevel, RepeatMode, StatusCallback,
};
pub use atv_poller::{PollStats, PollerConfig};
pub use atv_state::{ChannelMap, ChannelUpdate, PositionState, PropertyKey};
