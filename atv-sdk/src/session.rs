//! Device session
//!
//! Ties one device together: the state mirror, the gated control channel,
//! the status poller and the sink that receives channel updates.
//!
//! ```text
//! user command ──► handle_command ──► GatedChannel ──► device
//!                        │                                │
//!                        └─► PendingUpdateBudget           │ DeviceEvent
//!                                 │                       ▼
//!                  StatusPoller ◄─┘            handle_status_event
//!                                                         │
//!                                      StatusEventMapper ─┴─► ChannelStateSink
//! ```
//!
//! Commands are blocking: they wait for the command gate and for the device.
//! Call them from a worker thread or `spawn_blocking` inside async code.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use atv_control::{
    CommandGate, DeviceControlChannel, DeviceEvent, DiscoveredDevices, GatedChannel, StatusCallback,
};
use atv_poller::{PendingUpdateBudget, PollStats, StatusFetch, StatusPoller};
use atv_state::{resolve_position, ChannelMap, PositionState, PropertyKey, StatusEventMapper};

use crate::command::ChannelCommand;
use crate::config::SessionConfig;
use crate::error::{Result, SdkError};
use crate::sink::ChannelStateSink;

/// Last pairing attempt reported by the device layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingOutcome {
    pub success: bool,
    pub message: String,
}

pub struct DeviceSession {
    config: SessionConfig,
    state: Mutex<StatusEventMapper>,
    control: Arc<GatedChannel>,
    budget: Arc<PendingUpdateBudget>,
    poller: StatusPoller,
    sink: Arc<dyn ChannelStateSink>,
    devices: Mutex<Option<DiscoveredDevices>>,
    pairing: Mutex<Option<PairingOutcome>>,
    device_id: Mutex<Option<String>>,
    torn_down: AtomicBool,
}

impl DeviceSession {
    /// Create a session with the default channel layout
    pub fn new(
        config: SessionConfig,
        channel: Arc<dyn DeviceControlChannel>,
        sink: Arc<dyn ChannelStateSink>,
    ) -> Result<Self> {
        Self::with_channels(config, ChannelMap::default(), channel, sink)
    }

    pub fn with_channels(
        config: SessionConfig,
        channels: ChannelMap,
        channel: Arc<dyn DeviceControlChannel>,
        sink: Arc<dyn ChannelStateSink>,
    ) -> Result<Self> {
        config.validate()?;

        let control = Arc::new(GatedChannel::new(
            channel,
            config.target(),
            CommandGate::with_timeout(config.gate_timeout()),
        ));
        let budget = Arc::new(PendingUpdateBudget::new());
        let poller = StatusPoller::new(
            config.poller_config(),
            Arc::clone(&budget),
            Arc::clone(&control) as Arc<dyn StatusFetch>,
        );

        debug!("Session created for {}", control.target());
        Ok(Self {
            config,
            state: Mutex::new(StatusEventMapper::new(channels)),
            control,
            budget,
            poller,
            sink,
            devices: Mutex::new(None),
            pairing: Mutex::new(None),
            device_id: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        })
    }

    /// Start polling and queue a burst so the mirror fills in right away
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        self.ensure_active()?;
        self.poller.start()?;
        self.poller.request_burst();
        info!("Session for {} started", self.control.target());
        Ok(())
    }

    /// Route a user command for `channel`
    ///
    /// Invalid input is rejected before anything is sent. Every command that
    /// reaches the device (and every `REFRESH`) queues a burst of forced polls.
    pub fn handle_command(&self, channel: &str, value: &str) -> Result<()> {
        self.ensure_active()?;

        let command = {
            let state = self.state.lock();
            ChannelCommand::parse(channel, value, state.channels(), &self.config)
        }
        .map_err(|e| {
            warn!("Rejected command for {}: {}", channel, e);
            e
        })?;

        let sent = match command {
            ChannelCommand::Refresh => {
                debug!("Refresh requested on {}", channel);
                Ok(())
            }
            ChannelCommand::Keys(keys) => self.control.send_keys(&keys),
            ChannelCommand::Seek(request) => {
                let seconds = self.resolve_seek(&request)?;
                self.control.set_position(seconds)
            }
            ChannelCommand::Shuffle(enabled) => self.control.set_shuffle(enabled),
            ChannelCommand::Repeat(mode) => self.control.set_repeat(mode),
        };

        if let Err(e) = sent {
            warn!("Command for {} failed: {}", channel, e);
            return Err(e.into());
        }
        self.poller.request_burst();
        Ok(())
    }

    fn resolve_seek(&self, request: &str) -> Result<u64> {
        let position = self.state.lock().position();
        resolve_position(request, position.position(), position.total_time()).map_err(|e| {
            warn!("Ignoring seek '{}': {}", request, e);
            SdkError::from(e)
        })
    }

    /// Apply a raw status property reported by the device
    ///
    /// Updates are published while the state lock is held so the sink sees
    /// them in the same order as the cache.
    pub fn handle_status_event(&self, property: &str, raw: &str) {
        if self.is_torn_down() {
            trace!("Dropping {} after shutdown", property);
            return;
        }

        let follow_up = {
            let mut state = self.state.lock();
            let outcome = state.apply(property, raw);
            for update in &outcome.updates {
                self.sink.publish(&update.channel, &update.value);
            }
            outcome.follow_up_polls
        };

        if follow_up > 0 {
            self.budget.add(follow_up);
        }
    }

    /// Scan the network; the result arrives as a device list event
    pub fn scan(&self, timeout: Duration) -> Result<()> {
        self.ensure_active()?;
        Ok(self.control.scan(timeout)?)
    }

    /// Pair with the device under the configured remote name
    ///
    /// The outcome arrives as a pairing result event; a successful pairing
    /// also reports the login id to use from then on.
    pub fn pair(&self, pin: &str) -> Result<()> {
        self.ensure_active()?;

        let pin = pin.trim();
        if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
            warn!("Rejected pairing pin '{}'", pin);
            return Err(SdkError::InvalidPin(pin.to_string()));
        }

        info!("Pairing with {} as '{}'", self.control.target(), self.config.remote_name);
        Ok(self.control.pair(&self.config.remote_name, pin)?)
    }

    /// Feed device events into this session on a worker thread
    ///
    /// The thread holds only a weak reference and exits when the event
    /// stream closes, the session is dropped, or the session shuts down.
    pub fn spawn_event_pump(self: &Arc<Self>, events: mpsc::Receiver<DeviceEvent>) -> JoinHandle<()> {
        let session: Weak<Self> = Arc::downgrade(self);
        thread::spawn(move || {
            for event in events {
                let Some(session) = session.upgrade() else {
                    break;
                };
                if session.is_torn_down() {
                    break;
                }
                event.dispatch(session.as_ref());
            }
            debug!("Session event pump exited");
        })
    }

    /// Stop polling and drop any later results
    pub fn shutdown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.poller.stop();
        info!("Session for {} shut down", self.control.target());
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_torn_down() {
            Err(SdkError::TornDown)
        } else {
            Ok(())
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Cached value of one property
    pub fn status(&self, key: PropertyKey) -> String {
        self.state.lock().status().get(key).to_string()
    }

    pub fn status_snapshot(&self) -> HashMap<PropertyKey, String> {
        self.state.lock().status().snapshot()
    }

    pub fn position(&self) -> PositionState {
        self.state.lock().position()
    }

    pub fn pending_updates(&self) -> u32 {
        self.budget.pending()
    }

    pub fn poller_stats(&self) -> PollStats {
        self.poller.stats()
    }

    pub fn discovered_devices(&self) -> Option<DiscoveredDevices> {
        self.devices.lock().clone()
    }

    pub fn pairing_result(&self) -> Option<PairingOutcome> {
        self.pairing.lock().clone()
    }

    pub fn device_id(&self) -> Option<String> {
        self.device_id.lock().clone()
    }
}

impl StatusCallback for DeviceSession {
    fn on_status(&self, property: &str, value: &str) {
        self.handle_status_event(property, value);
    }

    fn on_pairing_result(&self, success: bool, message: &str) {
        if success {
            info!("Pairing succeeded: {}", message);
        } else {
            warn!("Pairing failed: {}", message);
        }
        *self.pairing.lock() = Some(PairingOutcome {
            success,
            message: message.to_string(),
        });
    }

    fn on_devices_discovered(&self, json: &str) {
        match DiscoveredDevices::from_json(json) {
            Ok(devices) => {
                info!("{} device(s) discovered", devices.len());
                *self.devices.lock() = Some(devices);
            }
            Err(e) => warn!("Ignoring malformed device list: {}", e),
        }
    }

    fn on_device_id(&self, id: &str) {
        info!("Generated device id {}", id);
        *self.device_id.lock() = Some(id.to_string());
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
