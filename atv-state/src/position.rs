//! Position and time arithmetic
//!
//! Converts between plain seconds and `HH:MM:SS` clock text, and resolves
//! user seek requests against the known position and total time:
//!
//! | Request     | Meaning                                        |
//! |-------------|------------------------------------------------|
//! | `90`        | absolute, 90 seconds                           |
//! | `+30`, `-1:00` | relative to the current position, clamped   |
//! | `50%`       | fraction of the total time (total must be known) |
//! | `1:02:03`   | absolute clock value                           |

use crate::error::{PositionError, Result};

/// Format seconds as `HH:MM:SS`
///
/// Hours are zero padded to two digits and keep growing past 99.
pub fn seconds_to_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Parse a bare integer, `MM:SS` or `HH:MM:SS` into seconds
pub fn clock_to_seconds(text: &str) -> Result<u64> {
    let text = text.trim();
    let fields: Vec<&str> = text.split(':').collect();
    if fields.len() > 3 {
        return Err(PositionError::Format(format!(
            "too many fields in '{}'",
            text
        )));
    }

    let mut total: u64 = 0;
    for field in fields {
        let value = parse_field(field)
            .ok_or_else(|| PositionError::Format(format!("non-numeric field in '{}'", text)))?;
        total = total
            .checked_mul(60)
            .and_then(|t| t.checked_add(value))
            .ok_or_else(|| PositionError::Format(format!("value out of range: '{}'", text)))?;
    }

    Ok(total)
}

fn parse_field(field: &str) -> Option<u64> {
    let field = field.trim();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Resolve a position request into absolute seconds
///
/// `current` and `total` are in seconds; a `total` of 0 means the duration is
/// unknown, which disables the upper clamp and rejects percentage requests.
pub fn resolve_position(request: &str, current: u64, total: u64) -> Result<u64> {
    let request = request.trim();

    if is_numeric(request) {
        return request
            .parse()
            .map_err(|_| PositionError::Format(format!("value out of range: '{}'", request)));
    }

    // A sign is only meaningful in front; "10-20" or "1:-30" fall through
    // to the clock parser and are rejected there
    if let Some(delta) = request.strip_prefix(['+', '-']) {
        let delta = clock_to_seconds(delta)?;
        let target = if request.starts_with('-') {
            current.saturating_sub(delta)
        } else {
            current.saturating_add(delta)
        };
        return Ok(clamp_to_total(target, total));
    }

    if let Some(percent) = request.strip_suffix('%') {
        if total == 0 {
            return Err(PositionError::PositionUnknown(request.to_string()));
        }
        let percent: f64 = percent
            .trim()
            .parse()
            .map_err(|_| PositionError::Format(format!("invalid percentage '{}'", request)))?;
        if !percent.is_finite() || percent < 0.0 {
            return Err(PositionError::Format(format!(
                "invalid percentage '{}'",
                request
            )));
        }
        let target = (total as f64 * percent / 100.0).floor() as u64;
        return Ok(clamp_to_total(target, total));
    }

    clock_to_seconds(request)
}

/// Clamp `seconds` to `total` when the total is known
pub fn clamp_to_total(seconds: u64, total: u64) -> u64 {
    if total > 0 {
        seconds.min(total)
    } else {
        seconds
    }
}

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
