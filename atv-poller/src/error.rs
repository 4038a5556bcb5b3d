//! Error types for the status poller

use thiserror::Error;

use atv_control::ControlError;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Status fetch failed: {0}")]
    Fetch(#[from] ControlError),

    #[error("Status fetch task failed: {0}")]
    Task(String),

    #[error("No tokio runtime available to run the poller")]
    NoRuntime,

    #[error("Invalid poller configuration: {0}")]
    Configuration(String),
}

pub type PollResult<T> = Result<T, PollError>;
