//! Channel command routing
//!
//! Turns a `(channel id, value)` pair coming from the user into a typed
//! command. Key channels take whitespace separated key names; the
//! playback channels take seek, shuffle and repeat values.

use atv_control::RepeatMode;
use atv_state::{ChannelMap, PropertyKey};

use crate::config::SessionConfig;
use crate::error::{Result, SdkError};

/// Single remote key channel
pub const CHANNEL_REMOTE_KEY: &str = "control#remoteKey";
/// Key sequence channel
pub const CHANNEL_KEYS_SEQUENCE: &str = "control#keysSequence";

/// Value that asks for fresh status instead of sending anything
pub const REFRESH: &str = "REFRESH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Only queue forced polls
    Refresh,
    Keys(Vec<String>),
    /// Seek request, resolved against the current position when executed
    Seek(String),
    Shuffle(bool),
    Repeat(RepeatMode),
}

impl ChannelCommand {
    pub fn parse(channel: &str, value: &str, channels: &ChannelMap, config: &SessionConfig) -> Result<Self> {
        let target = ChannelTarget::of(channel, channels)
            .ok_or_else(|| SdkError::UnknownChannel(channel.to_string()))?;

        let value = value.trim();
        if value == REFRESH {
            return Ok(ChannelCommand::Refresh);
        }

        let invalid = || SdkError::InvalidValue {
            channel: channel.to_string(),
            value: value.to_string(),
        };

        match target {
            ChannelTarget::Keys => {
                let sequence = config.key_alias(value).unwrap_or(value);
                let keys: Vec<String> = sequence.split_whitespace().map(str::to_string).collect();
                if keys.is_empty() {
                    return Err(invalid());
                }
                Ok(ChannelCommand::Keys(keys))
            }
            ChannelTarget::Property(PropertyKey::Position) => Ok(ChannelCommand::Seek(value.to_string())),
            ChannelTarget::Property(PropertyKey::Shuffle) => {
                parse_switch(value).map(ChannelCommand::Shuffle).ok_or_else(invalid)
            }
            ChannelTarget::Property(PropertyKey::Repeat) => {
                RepeatMode::parse(value).map(ChannelCommand::Repeat).ok_or_else(invalid)
            }
            // Read-only status channels only answer REFRESH
            ChannelTarget::Property(_) => Err(invalid()),
        }
    }

    /// Whether executing this command talks to the device
    pub fn is_device_command(&self) -> bool {
        !matches!(self, ChannelCommand::Refresh)
    }
}

enum ChannelTarget {
    Keys,
    Property(PropertyKey),
}

impl ChannelTarget {
    fn of(channel: &str, channels: &ChannelMap) -> Option<Self> {
        if channel == CHANNEL_REMOTE_KEY || channel == CHANNEL_KEYS_SEQUENCE {
            return Some(ChannelTarget::Keys);
        }
        channels.property_for(channel).map(ChannelTarget::Property)
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atv_state::GROUP_CONTROL;
    use rstest::rstest;

    fn parse(channel: &str, value: &str) -> Result<ChannelCommand> {
        let config = SessionConfig {
            key_movie: "top_menu down down select".to_string(),
            ..SessionConfig::new("10.0.0.5", "0xABC")
        };
        ChannelCommand::parse(channel, value, &ChannelMap::default(), &config)
    }

    #[rstest]
    #[case(CHANNEL_REMOTE_KEY, "menu", &["menu"])]
    #[case(CHANNEL_KEYS_SEQUENCE, " up  up select ", &["up", "up", "select"])]
    #[case(CHANNEL_KEYS_SEQUENCE, "movie", &["top_menu", "down", "down", "select"])]
    fn test_key_commands(#[case] channel: &str, #[case] value: &str, #[case] keys: &[&str]) {
        let expected = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(parse(channel, value).unwrap(), ChannelCommand::Keys(expected));
    }

    #[test]
    fn test_unconfigured_alias_is_sent_as_key() {
        assert_eq!(
            parse(CHANNEL_REMOTE_KEY, "music").unwrap(),
            ChannelCommand::Keys(vec!["music".to_string()])
        );
    }

    #[rstest]
    #[case("playStatus#position", "+30", ChannelCommand::Seek("+30".to_string()))]
    #[case("playStatus#shuffle", "ON", ChannelCommand::Shuffle(true))]
    #[case("playStatus#shuffle", "no", ChannelCommand::Shuffle(false))]
    #[case("playStatus#repeatState", "track", ChannelCommand::Repeat(RepeatMode::Track))]
    #[case("playStatus#repeatState", "2", ChannelCommand::Repeat(RepeatMode::All))]
    #[case("mediaInformation#title", "REFRESH", ChannelCommand::Refresh)]
    #[case(CHANNEL_REMOTE_KEY, "REFRESH", ChannelCommand::Refresh)]
    fn test_playback_commands(#[case] channel: &str, #[case] value: &str, #[case] expected: ChannelCommand) {
        assert_eq!(parse(channel, value).unwrap(), expected);
    }

    #[rstest]
    #[case("playStatus#shuffle", "maybe")]
    #[case("playStatus#repeatState", "forever")]
    #[case("mediaInformation#title", "New title")]
    #[case(CHANNEL_KEYS_SEQUENCE, "   ")]
    fn test_invalid_values(#[case] channel: &str, #[case] value: &str) {
        assert!(matches!(parse(channel, value), Err(SdkError::InvalidValue { .. })));
    }

    #[test]
    fn test_key_channels_live_in_control_group() {
        for channel in [CHANNEL_REMOTE_KEY, CHANNEL_KEYS_SEQUENCE] {
            assert_eq!(channel.split_once('#').map(|(group, _)| group), Some(GROUP_CONTROL));
        }
    }

    #[test]
    fn test_unknown_channel() {
        assert!(matches!(parse("audio#volume", "10"), Err(SdkError::UnknownChannel(_))));
    }
}
