//! Device properties and their channel mapping
//!
//! The device reports status as loosely typed `(property, value)` pairs.
//! [`PropertyKey`] enumerates the properties the mirror understands and
//! [`ChannelMap`] assigns each of them the channel it is published on.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status property reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    State,
    MediaType,
    Title,
    Album,
    Artist,
    Genre,
    Position,
    TotalTime,
    /// Playback progress as a percentage of the total time
    Progress,
    Repeat,
    Shuffle,
    ArtworkUrl,
}

impl PropertyKey {
    /// All known properties
    pub const ALL: [PropertyKey; 12] = [
        PropertyKey::State,
        PropertyKey::MediaType,
        PropertyKey::Title,
        PropertyKey::Album,
        PropertyKey::Artist,
        PropertyKey::Genre,
        PropertyKey::Position,
        PropertyKey::TotalTime,
        PropertyKey::Progress,
        PropertyKey::Repeat,
        PropertyKey::Shuffle,
        PropertyKey::ArtworkUrl,
    ];

    /// Property name as used on the device side
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKey::State => "state",
            PropertyKey::MediaType => "mediaType",
            PropertyKey::Title => "title",
            PropertyKey::Album => "album",
            PropertyKey::Artist => "artist",
            PropertyKey::Genre => "genre",
            PropertyKey::Position => "position",
            PropertyKey::TotalTime => "totalTime",
            PropertyKey::Progress => "progress",
            PropertyKey::Repeat => "repeat",
            PropertyKey::Shuffle => "shuffle",
            PropertyKey::ArtworkUrl => "artworkUrl",
        }
    }

    /// Default value held before the device reported anything
    pub fn default_value(&self) -> &'static str {
        match self {
            PropertyKey::State => "Idle",
            _ => "",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a property name is not a [`PropertyKey`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProperty(pub String);

impl fmt::Display for UnknownProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown property: {}", self.0)
    }
}

impl std::error::Error for UnknownProperty {}

impl FromStr for PropertyKey {
    type Err = UnknownProperty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownProperty(s.to_string()))
    }
}

/// Channel group holding the playback status channels
pub const GROUP_STATUS: &str = "playStatus";
/// Channel group holding the media metadata channels
pub const GROUP_MEDIA: &str = "mediaInformation";
/// Channel group holding the remote control channels
pub const GROUP_CONTROL: &str = "control";

/// Static mapping from property to channel id
///
/// Built once at session start and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    channels: HashMap<PropertyKey, String>,
}

impl ChannelMap {
    /// Create a map from explicit `(property, channel)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (PropertyKey, S)>,
        S: Into<String>,
    {
        Self {
            channels: pairs.into_iter().map(|(k, c)| (k, c.into())).collect(),
        }
    }

    /// Channel id for a property, if mapped
    pub fn channel(&self, key: PropertyKey) -> Option<&str> {
        self.channels.get(&key).map(String::as_str)
    }

    /// Reverse lookup: the property published on `channel`
    pub fn property_for(&self, channel: &str) -> Option<PropertyKey> {
        self.channels
            .iter()
            .find(|(_, c)| c.as_str() == channel)
            .map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        let status = |name: &str| format!("{}#{}", GROUP_STATUS, name);
        let media = |name: &str| format!("{}#{}", GROUP_MEDIA, name);

        Self::from_pairs([
            (PropertyKey::State, status("playMode")),
            (PropertyKey::Position, status("position")),
            (PropertyKey::TotalTime, status("totalTime")),
            (PropertyKey::Progress, status("progress")),
            (PropertyKey::Repeat, status("repeatState")),
            (PropertyKey::Shuffle, status("shuffle")),
            (PropertyKey::MediaType, media("mediaType")),
            (PropertyKey::Title, media("title")),
            (PropertyKey::Album, media("album")),
            (PropertyKey::Artist, media("artist")),
            (PropertyKey::Genre, media("genre")),
            (PropertyKey::ArtworkUrl, media("artworkUrl")),
        ])
    }
}
