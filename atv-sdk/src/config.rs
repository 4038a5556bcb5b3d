//! Session configuration
//!
//! Stored as JSON with camelCase keys; every field except the device
//! address and login id has a default.
//!
//! ```json
//! {
//!   "ipAddress": "192.168.1.20",
//!   "loginId": "0x4A2B9C00DEADBEEF",
//!   "keyMovie": "top_menu down select",
//!   "updateInterval": 1000
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use atv_control::{DeviceTarget, DEFAULT_EXECUTABLE};
use atv_poller::PollerConfig;

use crate::error::{Result, SdkError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub ip_address: String,
    pub login_id: String,

    /// Key sequence sent for the `movie` alias
    pub key_movie: String,
    /// Key sequence sent for the `tvshow` alias
    pub key_tv_show: String,
    /// Key sequence sent for the `music` alias
    pub key_music: String,

    /// Name announced when pairing
    pub remote_name: String,

    /// Poll tick in milliseconds
    /// Default: 1000
    pub update_interval: u64,

    /// Natural fetch every N ticks
    /// Default: 5
    pub skip_count: u32,

    /// Forced fetches queued after a command
    /// Default: 3
    pub force_burst: u32,

    /// Wait for the command gate, in milliseconds
    /// Default: 10000
    pub gate_timeout: u64,

    /// Longest a single device call may run before it is killed, in milliseconds
    /// Default: 10000
    pub command_timeout: u64,

    /// Control executable
    /// Default: "atvremote"
    pub executable: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ip_address: String::new(),
            login_id: String::new(),
            key_movie: String::new(),
            key_tv_show: String::new(),
            key_music: String::new(),
            remote_name: "atv-sdk".to_string(),
            update_interval: 1000,
            skip_count: 5,
            force_burst: 3,
            gate_timeout: 10_000,
            command_timeout: 10_000,
            executable: DEFAULT_EXECUTABLE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn new(ip_address: impl Into<String>, login_id: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            login_id: login_id.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ip_address.trim().is_empty() {
            return Err(SdkError::Config("ipAddress must not be empty".to_string()));
        }
        if self.login_id.trim().is_empty() {
            return Err(SdkError::Config("loginId must not be empty".to_string()));
        }
        if self.skip_count == 0 {
            return Err(SdkError::Config("skipCount must be greater than 0".to_string()));
        }
        if self.update_interval == 0 {
            return Err(SdkError::Config("updateInterval must be greater than 0".to_string()));
        }
        if self.command_timeout == 0 {
            return Err(SdkError::Config("commandTimeout must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn target(&self) -> DeviceTarget {
        DeviceTarget::new(self.ip_address.trim(), self.login_id.trim())
    }

    pub fn gate_timeout(&self) -> Duration {
        Duration::from_millis(self.gate_timeout)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.update_interval),
            skip_count: self.skip_count,
            force_burst: self.force_burst,
        }
    }

    /// Configured key sequence for a shortcut name, if any
    pub fn key_alias(&self, name: &str) -> Option<&str> {
        let sequence = match name.trim().to_ascii_lowercase().as_str() {
            "movie" => &self.key_movie,
            "tvshow" => &self.key_tv_show,
            "music" => &self.key_music,
            _ => return None,
        };
        Some(sequence.as_str()).filter(|s| !s.trim().is_empty())
    }
}
