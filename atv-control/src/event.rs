//! Events reported by the device control layer
//!
//! The control channel never calls back into the session directly. It sends
//! [`DeviceEvent`] messages over a `std::sync::mpsc` channel and a worker
//! thread hands them to a [`StatusCallback`] implementation.

use std::str::FromStr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

/// Severity attached to a device log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

/// Something the device control layer has to report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// A raw status property reported by the device
    Status { property: String, value: String },
    /// Outcome of a pairing attempt
    PairingResult { success: bool, message: String },
    /// Result of a scan, as a `{"devices":[...]}` JSON document
    DevicesDiscovered(String),
    /// Device id generated for pairing
    GeneratedDeviceId(String),
    /// Log output from the control layer
    Log { level: LogLevel, message: String },
}

impl DeviceEvent {
    pub fn status(property: impl Into<String>, value: impl Into<String>) -> Self {
        DeviceEvent::Status {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Hand this event to the matching callback method
    pub fn dispatch<C: StatusCallback + ?Sized>(&self, callback: &C) {
        match self {
            DeviceEvent::Status { property, value } => callback.on_status(property, value),
            DeviceEvent::PairingResult { success, message } => {
                callback.on_pairing_result(*success, message)
            }
            DeviceEvent::DevicesDiscovered(json) => callback.on_devices_discovered(json),
            DeviceEvent::GeneratedDeviceId(id) => callback.on_device_id(id),
            DeviceEvent::Log { level, message } => callback.on_log(*level, message),
        }
    }
}

/// Receiver side of the device event stream
pub trait StatusCallback: Send + Sync {
    fn on_status(&self, property: &str, value: &str);

    fn on_pairing_result(&self, success: bool, message: &str);

    fn on_devices_discovered(&self, json: &str);

    fn on_device_id(&self, id: &str) {
        debug!("Device id generated: {}", id);
    }

    /// Re-emit a device log line through `tracing`
    fn on_log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => error!(target: "atv_control::device", "{}", message),
            LogLevel::Warn => warn!(target: "atv_control::device", "{}", message),
            LogLevel::Info => info!(target: "atv_control::device", "{}", message),
            LogLevel::Debug => debug!(target: "atv_control::device", "{}", message),
            LogLevel::Trace => trace!(target: "atv_control::device", "{}", message),
        }
    }
}

/// Spawn a thread that drains `events` into `callback`
///
/// The thread exits once every sender has been dropped.
pub fn spawn_event_pump<C>(events: mpsc::Receiver<DeviceEvent>, callback: Arc<C>) -> JoinHandle<()>
where
    C: StatusCallback + ?Sized + 'static,
{
    thread::spawn(move || {
        for event in events {
            event.dispatch(callback.as_ref());
        }
        debug!("Device event stream closed");
    })
}
