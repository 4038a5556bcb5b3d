//! Status event mapper - turns raw device status into channel updates
//!
//! Every status event goes through the same pipeline:
//!
//! ```text
//! (property, raw) → PropertyKey → normalize → change detection → ChannelUpdate(s)
//! ```
//!
//! Unknown properties are dropped quietly. Side effects (clearing stale
//! music metadata, asking for a follow-up poll) only run when the event
//! actually changed something.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::position::{clock_to_seconds, seconds_to_clock};
use crate::property::{ChannelMap, PropertyKey};
use crate::status::{PlayStatus, PositionState};

/// Media type for which album, artist and genre stay meaningful
pub const MEDIA_TYPE_MUSIC: &str = "Music";

/// A value to publish on a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelUpdate {
    pub channel: String,
    pub value: String,
}

impl ChannelUpdate {
    pub fn new(channel: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            value: value.into(),
        }
    }
}

/// Result of applying one status event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapOutcome {
    /// Updates to publish, in order
    pub updates: Vec<ChannelUpdate>,
    /// Extra polls the event asks for (play state transitions)
    pub follow_up_polls: u32,
}

impl MapOutcome {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.follow_up_polls == 0
    }
}

/// Maps device properties to channels and tracks the last published state
#[derive(Debug, Clone)]
pub struct StatusEventMapper {
    channels: ChannelMap,
    status: PlayStatus,
    position: PositionState,
}

impl StatusEventMapper {
    /// Create a mapper with default status values
    pub fn new(channels: ChannelMap) -> Self {
        Self {
            channels,
            status: PlayStatus::new(),
            position: PositionState::new(),
        }
    }

    /// Apply a raw `(property, value)` status event
    pub fn apply(&mut self, property: &str, raw: &str) -> MapOutcome {
        let mut outcome = MapOutcome::default();

        let key = match property.parse::<PropertyKey>() {
            Ok(key) => key,
            Err(_) => {
                debug!("Ignoring unknown status property '{}'", property);
                return outcome;
            }
        };

        if self.channels.channel(key).is_none() {
            debug!("No channel mapped for property '{}', ignoring", key);
            return outcome;
        }

        let Some(value) = self.normalize(key, raw) else {
            return outcome;
        };

        if !self.publish(key, &value, &mut outcome) {
            trace!("Property '{}' unchanged ({})", key, value);
            return outcome;
        }

        match key {
            PropertyKey::MediaType if !value.eq_ignore_ascii_case(MEDIA_TYPE_MUSIC) => {
                for stale in [PropertyKey::Album, PropertyKey::Artist, PropertyKey::Genre] {
                    self.publish(stale, "", &mut outcome);
                }
            }
            PropertyKey::State => {
                outcome.follow_up_polls += 1;
            }
            PropertyKey::TotalTime => {
                // The new total may have clamped the stored position
                if !self.status.get(PropertyKey::Position).is_empty() {
                    let clock = seconds_to_clock(self.position.position());
                    self.publish(PropertyKey::Position, &clock, &mut outcome);
                }
            }
            _ => {}
        }

        outcome
    }

    fn normalize(&mut self, key: PropertyKey, raw: &str) -> Option<String> {
        match key {
            PropertyKey::Position | PropertyKey::TotalTime => {
                let seconds = match clock_to_seconds(raw) {
                    Ok(seconds) => seconds,
                    Err(e) => {
                        warn!("Dropping {} update '{}': {}", key, raw, e);
                        return None;
                    }
                };
                let stored = if key == PropertyKey::Position {
                    self.position.set_position(seconds)
                } else {
                    self.position.set_total_time(seconds)
                };
                Some(seconds_to_clock(stored))
            }
            PropertyKey::Progress => {
                match raw.trim().trim_end_matches('%').trim().parse::<f64>() {
                    Ok(percent) if percent.is_finite() => {
                        Some(format!("{}%", percent.round() as i64))
                    }
                    _ => {
                        warn!("Dropping {} update '{}': not a number", key, raw);
                        None
                    }
                }
            }
            _ => Some(raw.to_string()),
        }
    }

    /// Cache `value` and queue an update when it changed
    fn publish(&mut self, key: PropertyKey, value: &str, outcome: &mut MapOutcome) -> bool {
        let Some(channel) = self.channels.channel(key) else {
            return false;
        };
        if !self.status.set(key, value) {
            return false;
        }
        outcome.updates.push(ChannelUpdate::new(channel, value));
        true
    }

    /// Last published values
    pub fn status(&self) -> &PlayStatus {
        &self.status
    }

    /// Current numeric position and total time
    pub fn position(&self) -> PositionState {
        self.position
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }
}

impl Default for StatusEventMapper {
    fn default() -> Self {
        Self::new(ChannelMap::default())
    }
}
