//! Notification output backends.

use super::types::{Notification, NotificationChannel};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Desktop notification failed: {0}")]
    Desktop(String),
}

/// Where finished notifications go.
pub trait NotificationSink: Send + Sync {
    /// Register a channel. Calling it again for the same id is harmless.
    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), SinkError>;

    /// Show `notification`, replacing any visible one with the same id.
    fn show(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), SinkError> {
        tracing::info!(channel = %channel.id, name = %channel.name, "Notification channel ready");
        Ok(())
    }

    fn show(&self, notification: &Notification) -> Result<(), SinkError> {
        tracing::info!(
            id = notification.id,
            title = %notification.title,
            tap_url = %notification.tap_url,
            presentation = ?notification.presentation,
            "Notification"
        );
        Ok(())
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
pub use desktop::DesktopSink;

#[cfg(all(unix, not(target_os = "macos")))]
mod desktop {
    use notify_rust::{Hint, Timeout, Urgency};
    use tokio::sync::broadcast;

    use super::{NotificationSink, SinkError};
    use crate::events;
    use crate::notification::types::{Notification, NotificationChannel, Priority};

    const DEFAULT_ACTION: &str = "default";

    /// Freedesktop notifications. Clicking one sends its deep link to the
    /// WebView shell over the WebSocket.
    pub struct DesktopSink {
        app_name: String,
        ws_tx: broadcast::Sender<String>,
    }

    impl DesktopSink {
        pub fn new(app_name: impl Into<String>, ws_tx: broadcast::Sender<String>) -> Self {
            Self {
                app_name: app_name.into(),
                ws_tx,
            }
        }
    }

    impl NotificationSink for DesktopSink {
        fn create_channel(&self, channel: &NotificationChannel) -> Result<(), SinkError> {
            // Freedesktop has no channels; the category hint plays that role.
            tracing::debug!(channel = %channel.id, "Desktop sink channel registered");
            Ok(())
        }

        fn show(&self, notification: &Notification) -> Result<(), SinkError> {
            let mut desktop = notify_rust::Notification::new();
            desktop
                .appname(&self.app_name)
                .summary(&notification.title)
                .body(&notification.content)
                .id(notification.id)
                .hint(Hint::Category("im.received".into()))
                .urgency(match notification.priority {
                    Priority::High => Urgency::Normal,
                    Priority::Default => Urgency::Low,
                })
                .action(DEFAULT_ACTION, "Open")
                .timeout(Timeout::Default);

            let tap_url = notification.tap_url.clone();
            let ws_tx = self.ws_tx.clone();
            let show = move || match desktop.show() {
                Ok(handle) => handle.wait_for_action(|action| {
                    if action == DEFAULT_ACTION {
                        tracing::info!(url = %tap_url, "Notification clicked");
                        let _ = ws_tx.send(events::ws_message(
                            events::DEEP_LINK,
                            serde_json::json!({ "url": tap_url }),
                        ));
                    }
                }),
                Err(e) => tracing::warn!("Failed to show notification: {e}"),
            };

            match tokio::runtime::Handle::try_current() {
                Ok(rt) => {
                    rt.spawn_blocking(show);
                    Ok(())
                }
                Err(_) => Err(SinkError::Desktop("no async runtime".into())),
            }
        }
    }
}
