//! Cached playback status
//!
//! - `PlayStatus`: last value published per property, with change detection
//! - `PositionState`: numeric position and total time backing the clock channels

use std::collections::HashMap;

use crate::position::clamp_to_total;
use crate::property::PropertyKey;

/// Last published value for every property
///
/// `set` compares against the cached value and reports whether anything
/// changed, so identical status events collapse into a single update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayStatus {
    values: HashMap<PropertyKey, String>,
}

impl PlayStatus {
    /// Create a status with every property at its default
    pub fn new() -> Self {
        Self {
            values: PropertyKey::ALL
                .iter()
                .map(|key| (*key, key.default_value().to_string()))
                .collect(),
        }
    }

    /// Cached value for a property
    pub fn get(&self, key: PropertyKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }

    /// Store a value, returning whether it differs from the cached one
    pub fn set(&mut self, key: PropertyKey, value: &str) -> bool {
        if self.get(key) == value {
            return false;
        }
        self.values.insert(key, value.to_string());
        true
    }

    /// Copy of all cached values
    pub fn snapshot(&self) -> HashMap<PropertyKey, String> {
        self.values.clone()
    }
}

impl Default for PlayStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Current position and total time in seconds, 0 meaning unknown
///
/// The position never exceeds a known total time; out-of-range input is
/// clamped rather than rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionState {
    position: u64,
    total_time: u64,
}

impl PositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn total_time(&self) -> u64 {
        self.total_time
    }

    /// Update the position, returning the stored (clamped) value
    pub fn set_position(&mut self, seconds: u64) -> u64 {
        self.position = clamp_to_total(seconds, self.total_time);
        self.position
    }

    /// Update the total time; the position is clamped to the new total
    pub fn set_total_time(&mut self, seconds: u64) -> u64 {
        self.total_time = seconds;
        self.position = clamp_to_total(self.position, seconds);
        self.total_time
    }
}
