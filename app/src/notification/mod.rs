//! Message decoding and presentation.

pub mod decoder;
pub mod deeplink;
pub mod presenter;
pub mod sink;
pub mod types;

use std::sync::Arc;

use tokio::sync::broadcast;

pub use presenter::NotificationPresenter;
pub use sink::{LogSink, NotificationSink};

pub const APP_NAME: &str = "Discord";

/// Desktop notifications where a notification server exists, the log
/// otherwise.
pub fn default_sink(ws_tx: broadcast::Sender<String>) -> Arc<dyn NotificationSink> {
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Arc::new(sink::DesktopSink::new(APP_NAME, ws_tx))
    }
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    {
        drop(ws_tx);
        Arc::new(LogSink)
    }
}
