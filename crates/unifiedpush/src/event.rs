//! Events delivered by a distributor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Web-push encryption material handed over together with an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPushKeys {
    pub public_key: String,
    pub auth_secret: String,
}

/// Why a distributor refused a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedReason {
    Internal,
    Network,
    ActionRequired,
    VapidRequired,
    Other(String),
}

impl FailedReason {
    /// Parse a distributor-provided reason string.
    pub fn parse(reason: &str) -> Self {
        let normalized = reason.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "" | "internal" | "internal_error" => Self::Internal,
            "network" | "network_error" => Self::Network,
            "action_required" => Self::ActionRequired,
            s if s.contains("vapid") => Self::VapidRequired,
            _ => Self::Other(reason.trim().to_string()),
        }
    }

    pub fn requires_vapid(&self) -> bool {
        matches!(self, Self::VapidRequired)
    }
}

impl fmt::Display for FailedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("internal error"),
            Self::Network => f.write_str("network error"),
            Self::ActionRequired => f.write_str("action required"),
            Self::VapidRequired => f.write_str("VAPID key required"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// A callback from the distributor framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    NewEndpoint {
        instance: String,
        endpoint: String,
        keys: Option<WebPushKeys>,
    },
    Message {
        instance: String,
        payload: Vec<u8>,
    },
    RegistrationFailed {
        instance: String,
        reason: FailedReason,
    },
    Unregistered {
        instance: String,
    },
}

impl PushEvent {
    pub fn instance(&self) -> &str {
        match self {
            Self::NewEndpoint { instance, .. }
            | Self::Message { instance, .. }
            | Self::RegistrationFailed { instance, .. }
            | Self::Unregistered { instance } => instance,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewEndpoint { .. } => "new_endpoint",
            Self::Message { .. } => "message",
            Self::RegistrationFailed { .. } => "registration_failed",
            Self::Unregistered { .. } => "unregistered",
        }
    }
}
