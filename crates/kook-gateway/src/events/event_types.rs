//! Event type classification
//!
//! `type` of an event payload selects a message kind; system events (type 255)
//! carry their kind as a string in `extra.type`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Raw `type` value marking a system event
pub const SYSTEM_EVENT_TYPE: u32 = 255;

/// Message content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Image,
    Video,
    File,
    Audio,
    KMarkdown,
    Card,
    Unknown(u32),
}

impl MessageType {
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Text,
            2 => Self::Image,
            3 => Self::Video,
            4 => Self::File,
            8 => Self::Audio,
            9 => Self::KMarkdown,
            10 => Self::Card,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Text => 1,
            Self::Image => 2,
            Self::Video => 3,
            Self::File => 4,
            Self::Audio => 8,
            Self::KMarkdown => 9,
            Self::Card => 10,
            Self::Unknown(value) => value,
        }
    }

    /// Whether the content is text a user typed (plain or markdown)
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::KMarkdown)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::File => "file",
            Self::Audio => "audio",
            Self::KMarkdown => "kmarkdown",
            Self::Card => "card",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}

/// System event kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SystemEventKind {
    /// User joined a voice channel
    JoinedChannel,
    /// User left a voice channel
    ExitedChannel,
    /// User profile changed
    UserUpdated,
    /// The bot joined a guild
    SelfJoinedGuild,
    /// The bot left a guild
    SelfExitedGuild,
    /// A button in a card message was clicked
    MessageBtnClick,
    /// Any other system event
    Other(String),
}

impl SystemEventKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "joined_channel" => Self::JoinedChannel,
            "exited_channel" => Self::ExitedChannel,
            "user_updated" => Self::UserUpdated,
            "self_joined_guild" => Self::SelfJoinedGuild,
            "self_exited_guild" => Self::SelfExitedGuild,
            "message_btn_click" => Self::MessageBtnClick,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get the wire name of this kind
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::JoinedChannel => "joined_channel",
            Self::ExitedChannel => "exited_channel",
            Self::UserUpdated => "user_updated",
            Self::SelfJoinedGuild => "self_joined_guild",
            Self::SelfExitedGuild => "self_exited_guild",
            Self::MessageBtnClick => "message_btn_click",
            Self::Other(name) => name,
        }
    }
}

impl Serialize for SystemEventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SystemEventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

impl fmt::Display for SystemEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
