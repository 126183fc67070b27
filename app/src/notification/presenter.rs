//! Turns decoded messages into notifications.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::deeplink::deep_link;
use super::sink::NotificationSink;
use super::types::{
    Category, DecodedMessage, Importance, Notification, NotificationChannel, NotificationStyle,
    Presentation, Priority, PublicVersion, Visibility,
};
use crate::config::Preferences;
use crate::lifecycle::ForegroundTracker;

/// Identity reused by every hybrid-style notification.
pub const FIXED_NOTIFICATION_ID: u32 = 1000;
pub const CHANNEL_ID: &str = "discord_messages";
pub const CHANNEL_NAME: &str = "Discord Messages";
pub const GROUP_KEY: &str = "discord_messages_group";

const EXPANDED_THRESHOLD: usize = 40;

pub struct NotificationPresenter {
    prefs: Preferences,
    foreground: Arc<ForegroundTracker>,
    sink: Arc<dyn NotificationSink>,
    channel_ready: AtomicBool,
    last_id: AtomicU32,
}

impl NotificationPresenter {
    pub fn new(
        prefs: Preferences,
        foreground: Arc<ForegroundTracker>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            prefs,
            foreground,
            sink,
            channel_ready: AtomicBool::new(false),
            last_id: AtomicU32::new(0),
        }
    }

    pub fn channel() -> NotificationChannel {
        NotificationChannel {
            id: CHANNEL_ID.into(),
            name: CHANNEL_NAME.into(),
            importance: Importance::High,
        }
    }

    /// Create the message channel once.
    pub fn ensure_channel(&self) {
        if self.channel_ready.load(Ordering::SeqCst) {
            return;
        }
        match self.sink.create_channel(&Self::channel()) {
            Ok(()) => self.channel_ready.store(true, Ordering::SeqCst),
            Err(e) => tracing::warn!("Failed to create notification channel: {e}"),
        }
    }

    /// Show `message` unless the app is in the foreground or notifications
    /// are switched off. Returns the notification id when one was shown.
    pub fn present(&self, message: &DecodedMessage) -> Option<u32> {
        if self.foreground.is_in_foreground() {
            tracing::debug!("App in foreground, notification suppressed");
            return None;
        }
        if !self.prefs.notifications_enabled() {
            tracing::debug!("Notifications disabled, message dropped");
            return None;
        }
        let notification = self.build(message, self.prefs.notification_style());
        self.deliver(notification)
    }

    /// Show a sample notification regardless of foreground state.
    pub fn present_test(&self) -> Option<u32> {
        let message = DecodedMessage {
            title: "Test notification".into(),
            content: "Push notifications are working.".into(),
            channel_id: String::new(),
            guild_id: String::new(),
        };
        let notification = self.build(&message, self.prefs.notification_style());
        self.deliver(notification)
    }

    pub fn build(&self, message: &DecodedMessage, style: NotificationStyle) -> Notification {
        let presentation = if message.content.chars().count() > EXPANDED_THRESHOLD
            || message.content.contains('\n')
        {
            Presentation::Expanded
        } else {
            Presentation::Compact
        };

        let (id, group) = match style {
            NotificationStyle::Multi => (self.next_random_id(), Some(GROUP_KEY.to_string())),
            NotificationStyle::Hybrid => (FIXED_NOTIFICATION_ID, None),
        };

        Notification {
            id,
            channel_id: CHANNEL_ID.into(),
            title: message.title.clone(),
            content: message.content.clone(),
            tap_url: deep_link(&message.channel_id, &message.guild_id),
            priority: Priority::High,
            category: Category::Message,
            visibility: Visibility::Private,
            public_version: Some(PublicVersion {
                title: "Discord".into(),
                content: "New message".into(),
            }),
            presentation,
            group,
            auto_cancel: true,
        }
    }

    fn deliver(&self, notification: Notification) -> Option<u32> {
        self.ensure_channel();
        match self.sink.show(&notification) {
            Ok(()) => Some(notification.id),
            Err(e) => {
                tracing::warn!(id = notification.id, "Failed to show notification: {e}");
                None
            }
        }
    }

    /// Random id that is never 0, the fixed id, or the previous one.
    fn next_random_id(&self) -> u32 {
        let previous = self.last_id.load(Ordering::SeqCst);
        let id = loop {
            let candidate: u32 = rand::random();
            if candidate != 0 && candidate != FIXED_NOTIFICATION_ID && candidate != previous {
                break candidate;
            }
        };
        self.last_id.store(id, Ordering::SeqCst);
        id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use prefs_db::Database;

    use super::*;
    use crate::notification::sink::SinkError;

    #[derive(Default)]
    struct RecordingSink {
        channels: Mutex<Vec<NotificationChannel>>,
        shown: Mutex<Vec<Notification>>,
    }

    impl NotificationSink for RecordingSink {
        fn create_channel(&self, channel: &NotificationChannel) -> Result<(), SinkError> {
            self.channels.lock().unwrap().push(channel.clone());
            Ok(())
        }

        fn show(&self, notification: &Notification) -> Result<(), SinkError> {
            self.shown.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct Fixture {
        presenter: NotificationPresenter,
        prefs: Preferences,
        foreground: Arc<ForegroundTracker>,
        sink: Arc<RecordingSink>,
    }

    fn fixture() -> Fixture {
        let prefs = Preferences::new(Database::open_in_memory().unwrap());
        let foreground = Arc::new(ForegroundTracker::default());
        let sink = Arc::new(RecordingSink::default());
        let presenter = NotificationPresenter::new(prefs.clone(), foreground.clone(), sink.clone());
        Fixture {
            presenter,
            prefs,
            foreground,
            sink,
        }
    }

    fn message(content: &str) -> DecodedMessage {
        DecodedMessage {
            title: "Discord".into(),
            content: content.into(),
            channel_id: "42".into(),
            guild_id: "7".into(),
        }
    }

    #[test]
    fn multi_style_gives_distinct_ids() {
        let f = fixture();
        f.prefs.set_notification_style(NotificationStyle::Multi);
        let a = f.presenter.present(&message("one")).unwrap();
        let b = f.presenter.present(&message("two")).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, FIXED_NOTIFICATION_ID);
        assert_ne!(b, 0);
        let shown = f.sink.shown.lock().unwrap();
        assert!(shown.iter().all(|n| n.group.as_deref() == Some(GROUP_KEY)));
    }

    #[test]
    fn hybrid_style_reuses_fixed_id() {
        let f = fixture();
        let a = f.presenter.present(&message("one")).unwrap();
        let b = f.presenter.present(&message("two")).unwrap();
        assert_eq!(a, FIXED_NOTIFICATION_ID);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_style_uses_fixed_id() {
        let f = fixture();
        f.prefs
            .set_notification_style(NotificationStyle::from_setting("sparkly"));
        assert_eq!(
            f.presenter.present(&message("x")),
            Some(FIXED_NOTIFICATION_ID)
        );
    }

    #[test]
    fn foreground_suppresses_notifications() {
        let f = fixture();
        f.foreground.activity_started();
        assert_eq!(f.presenter.present(&message("hidden")), None);
        assert!(f.sink.shown.lock().unwrap().is_empty());

        f.foreground.activity_stopped(false);
        assert!(f.presenter.present(&message("shown")).is_some());
    }

    #[test]
    fn disabled_notifications_are_dropped() {
        let f = fixture();
        f.prefs.set_notifications_enabled(false);
        assert_eq!(f.presenter.present(&message("x")), None);
    }

    #[test]
    fn expanded_presentation_threshold() {
        let f = fixture();
        let style = NotificationStyle::Hybrid;
        let exactly_40 = "a".repeat(40);
        assert_eq!(
            f.presenter.build(&message(&exactly_40), style).presentation,
            Presentation::Compact
        );
        assert_eq!(
            f.presenter.build(&message(&"a".repeat(41)), style).presentation,
            Presentation::Expanded
        );
        assert_eq!(
            f.presenter.build(&message("two\nlines"), style).presentation,
            Presentation::Expanded
        );
    }

    #[test]
    fn notification_fields() {
        let f = fixture();
        let n = f.presenter.build(&message("hi"), NotificationStyle::Hybrid);
        assert_eq!(n.channel_id, CHANNEL_ID);
        assert_eq!(n.tap_url, "https://discord.com/channels/7/42");
        assert_eq!(n.priority, Priority::High);
        assert_eq!(n.category, Category::Message);
        assert_eq!(n.visibility, Visibility::Private);
        assert!(n.auto_cancel);
        let public = n.public_version.unwrap();
        assert!(!public.content.contains("hi"));
    }

    #[test]
    fn channel_is_created_once() {
        let f = fixture();
        f.presenter.ensure_channel();
        f.presenter.present(&message("a"));
        f.presenter.present(&message("b"));
        let channels = f.sink.channels.lock().unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, CHANNEL_ID);
        assert_eq!(channels[0].importance, Importance::High);
    }

    #[test]
    fn test_notification_ignores_foreground() {
        let f = fixture();
        f.foreground.activity_started();
        assert!(f.presenter.present_test().is_some());
    }
}
