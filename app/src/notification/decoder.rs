//! Push payload decoding.
//!
//! Payloads are expected to be JSON objects but anything else is shown as
//! plain text. Decoding never fails.

use serde_json::{Map, Value};

use super::types::DecodedMessage;

pub const DEFAULT_TITLE: &str = "Discord";

pub fn decode(payload: &[u8]) -> DecodedMessage {
    let raw = String::from_utf8_lossy(payload).into_owned();

    let fields = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::debug!("Payload is not a JSON object, showing raw text");
            let mut map = Map::new();
            map.insert("content".into(), Value::String(raw.clone()));
            map.insert("title".into(), Value::String(DEFAULT_TITLE.into()));
            map
        }
    };

    let title = opt_string(&fields, "title", DEFAULT_TITLE);
    let content = opt_string(&fields, "content", &raw);
    let sender = opt_string(&fields, "sender", "");

    let title = if sender.is_empty() {
        title
    } else if title == DEFAULT_TITLE {
        format!("Message from {sender}")
    } else {
        format!("{title} from {sender}")
    };

    DecodedMessage {
        title,
        content,
        channel_id: opt_string(&fields, "channel_id", ""),
        guild_id: opt_string(&fields, "guild_id", ""),
    }
}

/// Strings verbatim, other scalars stringified, missing or null gives `default`.
fn opt_string(fields: &Map<String, Value>, key: &str, default: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_combined_with_sender() {
        let msg = decode(br#"{"title":"T","content":"C","sender":"S"}"#);
        assert_eq!(msg.title, "T from S");
        assert_eq!(msg.content, "C");
    }

    #[test]
    fn default_title_with_sender() {
        let msg = decode(br#"{"content":"hey","sender":"alice"}"#);
        assert_eq!(msg.title, "Message from alice");
    }

    #[test]
    fn content_only() {
        let msg = decode(br#"{"content":"C"}"#);
        assert_eq!(msg.title, "Discord");
        assert_eq!(msg.content, "C");
        assert_eq!(msg.channel_id, "");
        assert_eq!(msg.guild_id, "");
    }

    #[test]
    fn plain_text_payload() {
        let msg = decode(b"hello");
        assert_eq!(msg.title, "Discord");
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn json_that_is_not_an_object_is_raw_text() {
        let msg = decode(b"[1,2,3]");
        assert_eq!(msg.title, "Discord");
        assert_eq!(msg.content, "[1,2,3]");
    }

    #[test]
    fn missing_content_falls_back_to_raw_json() {
        let raw = r#"{"title":"Only title"}"#;
        let msg = decode(raw.as_bytes());
        assert_eq!(msg.title, "Only title");
        assert_eq!(msg.content, raw);
    }

    #[test]
    fn numeric_ids_are_stringified_and_null_is_missing() {
        let msg = decode(br#"{"content":"x","channel_id":42,"guild_id":null}"#);
        assert_eq!(msg.channel_id, "42");
        assert_eq!(msg.guild_id, "");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let msg = decode(&[0x68, 0x69, 0xff]);
        assert_eq!(msg.title, "Discord");
        assert!(msg.content.starts_with("hi"));
    }
}
