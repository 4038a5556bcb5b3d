//! Error types for atv-state

use thiserror::Error;

/// Errors produced while resolving position and time text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// Malformed clock or position text
    #[error("Invalid position format: {0}")]
    Format(String),

    /// A percentage was requested while the total time is unknown
    #[error("Total time unknown, cannot resolve percentage position {0}")]
    PositionUnknown(String),
}

/// Result type for position arithmetic
pub type Result<T> = std::result::Result<T, PositionError>;
