//! Typed access to the preference store.
//!
//! Reads never fail outward: a storage error is logged and the default is
//! returned instead.

use prefs_db::Database;
use unifiedpush::dbus::SelectionStore;
use unifiedpush::{RegistrationStore, VapidKeyPair, WebPushKeys};

use super::defaults::get_default;
use super::manager::SettingsManager;
use crate::notification::types::NotificationStyle;

#[derive(Clone)]
pub struct Preferences {
    sm: SettingsManager,
}

impl Preferences {
    pub fn new(db: Database) -> Self {
        Self {
            sm: SettingsManager::new(db),
        }
    }

    pub fn is_first_launch(&self) -> bool {
        self.read("first_launch") == "true"
    }

    pub fn set_first_launch_complete(&self) {
        self.write("first_launch", "false");
    }

    pub fn notification_style(&self) -> NotificationStyle {
        NotificationStyle::from_setting(&self.read("notification_style"))
    }

    /// Store the chosen style and remember that the user made a choice.
    pub fn set_notification_style(&self, style: NotificationStyle) {
        self.write("notification_style", style.as_str());
        self.write("notification_style_set", "true");
    }

    pub fn is_notification_style_set(&self) -> bool {
        self.read("notification_style_set") == "true"
    }

    pub fn notifications_enabled(&self) -> bool {
        self.read("notifications_enabled") != "false"
    }

    pub fn set_notifications_enabled(&self, enabled: bool) {
        self.write("notifications_enabled", if enabled { "true" } else { "false" });
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.sm
    }

    /// Instance token for this installation, created on first use.
    pub fn instance_token(&self) -> String {
        let token = self.read("push_instance");
        if !token.is_empty() {
            return token;
        }
        let token = uuid::Uuid::new_v4().to_string();
        self.write("push_instance", &token);
        tracing::info!(instance = %token, "Generated push instance token");
        token
    }

    fn read(&self, key: &str) -> String {
        match self.sm.get_setting(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read preference {key}: {e}");
                get_default(key).unwrap_or_default().to_string()
            }
        }
    }

    fn read_optional(&self, key: &str) -> Option<String> {
        let value = self.read(key);
        if value.is_empty() { None } else { Some(value) }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.sm.set_setting(key, value) {
            tracing::error!("Failed to write preference {key}: {e}");
        }
    }
}

impl RegistrationStore for Preferences {
    fn current_distributor(&self) -> Option<String> {
        self.read_optional("current_distributor")
    }

    fn set_current_distributor(&self, distributor: Option<&str>) {
        self.write("current_distributor", distributor.unwrap_or_default());
    }

    fn endpoint(&self) -> Option<String> {
        self.read_optional("current_endpoint")
    }

    fn set_endpoint(&self, endpoint: Option<&str>) {
        self.write("current_endpoint", endpoint.unwrap_or_default());
    }

    fn vapid_enabled(&self) -> bool {
        self.read("vapid_enabled") == "true"
    }

    fn vapid_keys(&self) -> Option<VapidKeyPair> {
        let public = self.read_optional("vapid_public_key")?;
        let private = self.read_optional("vapid_private_key")?;
        match VapidKeyPair::from_parts(&public, &private) {
            Ok(keys) => Some(keys),
            Err(e) => {
                tracing::warn!("Stored VAPID keys are unusable: {e}");
                None
            }
        }
    }

    fn save_vapid_keys(&self, keys: &VapidKeyPair) {
        self.write("vapid_public_key", keys.public_key());
        self.write("vapid_private_key", keys.private_key());
    }

    fn save_webpush_keys(&self, keys: &WebPushKeys) {
        self.write("webpush_public_key", &keys.public_key);
        self.write("webpush_auth_secret", &keys.auth_secret);
    }
}

impl SelectionStore for Preferences {
    fn load(&self) -> Option<String> {
        self.read_optional("up_saved_distributor")
    }

    fn save(&self, distributor: Option<&str>) {
        self.write("up_saved_distributor", distributor.unwrap_or_default());
    }
}
