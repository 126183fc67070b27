use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use super::ForwardError;
use super::config::{ForwardConfig, Format};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TITLE: &str = "Discord";

/// Posts notification text to the configured push endpoint.
pub struct Sender {
    client: reqwest::Client,
    endpoint: String,
    format: Format,
}

impl Sender {
    pub fn new(config: &ForwardConfig) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            format: config.format,
        })
    }

    /// Content type and body for one notification.
    pub fn body(&self, title: &str, content: &str) -> (&'static str, String) {
        match self.format {
            Format::Text => ("text/plain", content.to_string()),
            Format::Json => {
                let title = if title.trim().is_empty() { DEFAULT_TITLE } else { title };
                (
                    "application/json",
                    json!({ "title": title, "content": content }).to_string(),
                )
            }
        }
    }

    pub async fn send(&self, title: &str, content: &str) -> Result<StatusCode, ForwardError> {
        let (content_type, body) = self.body(title, content);
        let res = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = res.status();
        tracing::info!(status = status.as_u16(), "Notification forwarded");
        if status.as_u16() > 299 {
            let text = res.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Send failed: {text}");
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_body_is_raw_content() {
        let sender = Sender::new(&ForwardConfig::new("https://ntfy.sh/t")).unwrap();
        assert_eq!(sender.body("Alice", "hi"), ("text/plain", "hi".to_string()));
    }

    #[test]
    fn json_body_decodes_as_message() {
        let mut config = ForwardConfig::new("https://ntfy.sh/t");
        config.format = Format::Json;
        let sender = Sender::new(&config).unwrap();

        let (content_type, body) = sender.body("", "hi");
        assert_eq!(content_type, "application/json");
        let message = crate::notification::decoder::decode(body.as_bytes());
        assert_eq!(message.title, "Discord");
        assert_eq!(message.content, "hi");
    }
}
