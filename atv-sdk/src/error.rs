use thiserror::Error;

use atv_control::ControlError;
use atv_poller::PollError;
use atv_state::PositionError;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Poller error: {0}")]
    Poll(#[from] PollError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Invalid value '{value}' for channel {channel}")]
    InvalidValue { channel: String, value: String },

    #[error("Invalid pairing pin '{0}'")]
    InvalidPin(String),

    #[error("Session has been shut down")]
    TornDown,
}

impl SdkError {
    /// Busy gate or unreachable device: the same request may work later
    pub fn is_transient(&self) -> bool {
        match self {
            SdkError::Control(e) => e.is_transient(),
            SdkError::Poll(PollError::Fetch(e)) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Config(e.to_string())
    }
}

impl From<std::io::Error> for SdkError {
    fn from(e: std::io::Error) -> Self {
        SdkError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
