//! Error types for device control

use std::time::Duration;

use thiserror::Error;

use crate::channel::ExitCode;

/// The command gate could not be acquired in time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Control channel busy: gate not acquired within {timeout:?}")]
    Busy { timeout: Duration },
}

/// Errors from invoking the device control channel
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Control channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("Command '{command}' failed with exit code {code}")]
    CommandFailed { command: String, code: ExitCode },

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("Failed to parse device output: {0}")]
    Parse(String),
}

impl ControlError {
    /// Whether retrying on a later tick may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ControlError::Gate(_) | ControlError::ChannelUnavailable(_))
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(e: serde_json::Error) -> Self {
        ControlError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
