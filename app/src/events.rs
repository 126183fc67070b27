//! WebSocket event names and helpers.
//!
//! The WebView shell and the setup screen listen on `/ws` for these.

use serde::Serialize;
use serde_json::{Value, json};

pub const CONNECTED: &str = "connected";
pub const PONG: &str = "pong";
pub const REGISTRATION_STATUS: &str = "registration_status";
pub const DEEP_LINK: &str = "deep_link";
pub const SETTINGS_UPDATED: &str = "settings_updated";

#[derive(Debug, Clone, Serialize)]
pub struct SettingsUpdatedPayload {
    pub source: String,
    pub count: u32,
}

/// `{"type": kind, "data": data}` as a string ready for broadcast.
pub fn ws_message(kind: &str, data: Value) -> String {
    json!({ "type": kind, "data": data }).to_string()
}

/// Same as [`ws_message`] for any serializable payload.
pub fn ws_payload<T: Serialize>(kind: &str, payload: &T) -> String {
    match serde_json::to_value(payload) {
        Ok(data) => ws_message(kind, data),
        Err(e) => {
            tracing::warn!("Failed to serialize {kind} payload: {e}");
            ws_message(kind, Value::Null)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_shape() {
        let msg: Value = serde_json::from_str(&ws_message(DEEP_LINK, json!({"url": "x"}))).unwrap();
        assert_eq!(msg["type"], "deep_link");
        assert_eq!(msg["data"]["url"], "x");
    }

    #[test]
    fn payload_shape() {
        let payload = SettingsUpdatedPayload {
            source: "api".into(),
            count: 2,
        };
        let msg: Value =
            serde_json::from_str(&ws_payload(SETTINGS_UPDATED, &payload)).unwrap();
        assert_eq!(msg["data"]["count"], 2);
    }
}
