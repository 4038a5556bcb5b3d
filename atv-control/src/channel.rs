//! The device control channel seam
//!
//! Everything that talks to the device goes through [`DeviceControlChannel`].
//! Implementations are blocking; callers serialize access with the
//! [`CommandGate`](crate::gate::CommandGate).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Command token that asks the device for its current playback status
pub const STATUS_COMMAND: &str = "playing";

/// Command that pairs this remote with the device
pub const PAIR_COMMAND: &str = "pair";

/// Exit status reported by the control channel
///
/// 0 means success, anything else is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

/// Synchronous command interface to a media device
///
/// Status results are not returned from `execute`; they arrive later as
/// [`DeviceEvent`](crate::event::DeviceEvent)s.
pub trait DeviceControlChannel: Send + Sync {
    /// Run a command (one or more tokens) against the device
    fn execute(&self, tokens: &[String], address: &str, login_id: &str) -> Result<ExitCode>;

    /// Look for devices on the network
    fn scan(&self, timeout: Duration) -> Result<ExitCode>;
}

/// Address and login id of the device a session controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTarget {
    pub address: String,
    pub login_id: String,
}

impl DeviceTarget {
    pub fn new(address: impl Into<String>, login_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            login_id: login_id.into(),
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.login_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_success() {
        assert!(ExitCode::SUCCESS.is_success());
        assert!(ExitCode::from(0).is_success());
        assert!(!ExitCode(1).is_success());
        assert!(!ExitCode(-1).is_success());
    }
}
