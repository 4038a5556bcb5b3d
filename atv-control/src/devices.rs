//! Discovered device list

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A device found by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDevice {
    pub name: String,
    pub ip_address: String,
    #[serde(default)]
    pub login_id: String,
}

/// Scan result document: `{"devices":[{"name","ipAddress","loginId"}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevices {
    #[serde(default)]
    pub devices: Vec<DiscoveredDevice>,
}

impl DiscoveredDevices {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse `atvremote scan` output
    ///
    /// Device lines look like ` - Living Room at 10.0.0.10 (login id: 00000000-0000)`.
    /// Anything else is ignored.
    pub fn from_scan_output(output: &str) -> Self {
        let devices = output.lines().filter_map(parse_scan_line).collect();
        Self { devices }
    }

    pub fn find_by_address(&self, address: &str) -> Option<&DiscoveredDevice> {
        self.devices.iter().find(|d| d.ip_address == address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn parse_scan_line(line: &str) -> Option<DiscoveredDevice> {
    let entry = line.trim().strip_prefix("- ")?;
    let (name, rest) = entry.rsplit_once(" at ")?;
    let (address, login) = match rest.split_once(" (") {
        Some((address, details)) => {
            let login = details
                .trim_end_matches(')')
                .split_once(':')
                .map(|(_, id)| id.trim().to_string())
                .unwrap_or_default();
            (address, login)
        }
        None => (rest, String::new()),
    };
    Some(DiscoveredDevice {
        name: name.trim().to_string(),
        ip_address: address.trim().to_string(),
        login_id: login,
    })
}
