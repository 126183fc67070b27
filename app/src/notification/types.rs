//! Notification type definitions.

use serde::{Deserialize, Serialize};

/// User preference for how successive messages are shown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStyle {
    /// One notification per message, stacked in a group.
    Multi,
    /// A single notification replaced in place.
    #[default]
    Hybrid,
}

impl NotificationStyle {
    /// Unknown values, including the removed `single` style, read as hybrid.
    pub fn from_setting(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "multi" => Self::Multi,
            _ => Self::Hybrid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Multi => "multi",
            Self::Hybrid => "hybrid",
        }
    }
}

/// A push message after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedMessage {
    pub title: String,
    pub content: String,
    pub channel_id: String,
    pub guild_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Default,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Compact shows one line; expanded shows the whole text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    Compact,
    Expanded,
}

/// Content-free variant shown on the lock screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicVersion {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u32,
    pub channel_id: String,
    pub title: String,
    pub content: String,
    pub tap_url: String,
    pub priority: Priority,
    pub category: Category,
    pub visibility: Visibility,
    pub public_version: Option<PublicVersion>,
    pub presentation: Presentation,
    pub group: Option<String>,
    pub auto_cancel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Default,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}
