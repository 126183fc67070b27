//! SettingsManager: DB-backed settings with defaults, migration, and feature status.

use std::collections::HashMap;

use prefs_db::Database;

use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;
use super::{FeatureStatus, SettingInfo, SettingType};

const SECRET_MASK: &str = "********";

/// Wraps [`Database`] to provide high-level settings operations.
#[derive(Clone)]
pub struct SettingsManager {
    db: Database,
}

impl SettingsManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a setting value. Falls back to default if not in DB.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.db.get_setting(key)? {
            return Ok(val);
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Set a setting value with validation.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        let def = DEFAULT_SETTINGS
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("unknown setting key: {key}"))?;

        validate_setting(key, value)
            .map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;

        self.db.set_setting(key, value, setting_type(def.secret).as_str())?;
        Ok(())
    }

    /// Validate every entry first, then write them in one transaction.
    pub fn set_settings(&self, settings: &HashMap<String, String>) -> Result<(), anyhow::Error> {
        for (key, value) in settings {
            if !DEFAULT_SETTINGS.contains_key(key.as_str()) {
                anyhow::bail!("unknown setting key: {key}");
            }
            validate_setting(key, value)
                .map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;
        }
        self.db.update_settings_bulk(settings)?;
        Ok(())
    }

    /// Get all settings, filling in defaults for missing keys.
    pub fn get_all_settings(&self) -> Result<HashMap<String, SettingInfo>, anyhow::Error> {
        let db_settings = self.db.get_all_settings()?;
        let mut result = HashMap::new();

        for (key, def) in DEFAULT_SETTINGS.iter() {
            let value = db_settings
                .get(*key)
                .cloned()
                .unwrap_or_else(|| def.default.to_string());
            result.insert(
                key.to_string(),
                SettingInfo {
                    key: key.to_string(),
                    has_value: !value.is_empty(),
                    value,
                    setting_type: setting_type(def.secret),
                    required: def.required,
                    description: def.description.to_string(),
                },
            );
        }

        Ok(result)
    }

    /// Like [`get_all_settings`](Self::get_all_settings) with secret values masked.
    pub fn get_all_settings_masked(&self) -> Result<HashMap<String, SettingInfo>, anyhow::Error> {
        let mut all = self.get_all_settings()?;
        for info in all.values_mut() {
            if info.setting_type == SettingType::Secret && info.has_value {
                info.value = SECRET_MASK.to_string();
            }
        }
        Ok(all)
    }

    /// Initialize default settings in DB (skip existing).
    pub fn initialize_defaults(&self) -> Result<(), anyhow::Error> {
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            self.db
                .set_setting(key, def.default, setting_type(def.secret).as_str())?;
        }
        Ok(())
    }

    /// Reset the given keys (or all keys when empty) to their defaults.
    pub fn reset_to_defaults(&self, keys: &[String]) -> Result<u32, anyhow::Error> {
        let mut reset = 0u32;
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if !keys.is_empty() && !keys.iter().any(|k| k == key) {
                continue;
            }
            self.db
                .set_setting(key, def.default, setting_type(def.secret).as_str())?;
            reset += 1;
        }
        Ok(reset)
    }

    /// Migrate settings from environment variables to DB (one-time).
    ///
    /// The variable name is the upper-cased key, e.g. `SERVER_PORT`.
    pub fn migrate_from_env(&self) -> Result<u32, anyhow::Error> {
        self.migrate_from(|name| std::env::var(name).ok())
    }

    fn migrate_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<u32, anyhow::Error> {
        let mut migrated = 0u32;
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            let Some(env_val) = lookup(&key.to_ascii_uppercase()) else {
                continue;
            };
            if env_val.is_empty() {
                continue;
            }
            if let Err(e) = validate_setting(key, &env_val) {
                tracing::warn!("Ignoring env value for {key}: {e}");
                continue;
            }
            self.db
                .set_setting(key, &env_val, setting_type(def.secret).as_str())?;
            tracing::info!("Migrated setting from env: {key}");
            migrated += 1;
        }
        if migrated > 0 {
            tracing::info!("Migration completed: {migrated} settings migrated");
            if has_secret_in_env(&lookup) {
                tracing::warn!(
                    "SECURITY WARNING: Key material in env vars. \
                     Remove from .env after confirming migration."
                );
            }
        }
        Ok(migrated)
    }

    /// Summarize how far push setup has progressed.
    pub fn check_feature_status(&self) -> Result<FeatureStatus, anyhow::Error> {
        let mut status = FeatureStatus {
            push_registered: false,
            distributor_selected: false,
            style_chosen: self.get_setting("notification_style_set")? == "true",
            missing_settings: Vec::new(),
            warnings: Vec::new(),
        };

        for (key, def) in DEFAULT_SETTINGS.iter() {
            if def.required && self.get_setting(key)?.is_empty() {
                status.missing_settings.push(key.to_string());
            }
        }
        status.missing_settings.sort();

        if self.get_setting("current_distributor")?.is_empty() {
            status.warnings.push("No distributor selected".into());
        } else {
            status.distributor_selected = true;
        }

        if self.get_setting("current_endpoint")?.is_empty() {
            status.warnings.push("Not registered for push messages".into());
        } else {
            status.push_registered = true;
        }

        if self.get_setting("notifications_enabled")? == "false" {
            status.warnings.push("Notifications are disabled".into());
        }

        Ok(status)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

fn setting_type(secret: bool) -> SettingType {
    if secret {
        SettingType::Secret
    } else {
        SettingType::Normal
    }
}

fn has_secret_in_env(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    DEFAULT_SETTINGS
        .values()
        .filter(|d| d.secret)
        .any(|d| lookup(&d.key.to_ascii_uppercase()).is_some_and(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SettingsManager {
        SettingsManager::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn get_falls_back_to_default() {
        let sm = manager();
        assert_eq!(sm.get_setting("notification_style").unwrap(), "hybrid");
        assert!(sm.get_setting("nope").is_err());
    }

    #[test]
    fn set_rejects_unknown_and_invalid() {
        let sm = manager();
        assert!(sm.set_setting("nope", "1").is_err());
        assert!(sm.set_setting("retry_max_attempts", "0").is_err());
        sm.set_setting("retry_max_attempts", "3").unwrap();
        assert_eq!(sm.get_setting("retry_max_attempts").unwrap(), "3");
    }

    #[test]
    fn bulk_update_is_all_or_nothing() {
        let sm = manager();
        let mut batch = HashMap::new();
        batch.insert("notification_style".to_string(), "multi".to_string());
        batch.insert("server_port".to_string(), "0".to_string());
        assert!(sm.set_settings(&batch).is_err());
        assert_eq!(sm.get_setting("notification_style").unwrap(), "hybrid");

        batch.insert("server_port".to_string(), "9000".to_string());
        sm.set_settings(&batch).unwrap();
        assert_eq!(sm.get_setting("notification_style").unwrap(), "multi");
        assert_eq!(sm.get_setting("server_port").unwrap(), "9000");
    }

    #[test]
    fn initialize_defaults_keeps_existing_values() {
        let sm = manager();
        sm.set_setting("notification_style", "multi").unwrap();
        sm.initialize_defaults().unwrap();
        assert_eq!(sm.db().get_setting("notification_style").unwrap().as_deref(), Some("multi"));
        assert_eq!(sm.db().get_setting("first_launch").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn secrets_are_masked() {
        let sm = manager();
        sm.set_setting("vapid_private_key", "c2VjcmV0").unwrap();
        let all = sm.get_all_settings_masked().unwrap();
        assert_eq!(all["vapid_private_key"].value, SECRET_MASK);
        assert_eq!(all["webpush_auth_secret"].value, "");
        assert_eq!(all["notification_style"].value, "hybrid");
    }

    #[test]
    fn env_migration_only_fills_missing_keys() {
        let sm = manager();
        sm.set_setting("server_port", "9100").unwrap();
        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "9200"),
            ("NOTIFICATION_STYLE", "multi"),
            ("RETRY_MAX_ATTEMPTS", "999"),
        ]
        .into_iter()
        .collect();

        let migrated = sm
            .migrate_from(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(migrated, 1);
        assert_eq!(sm.get_setting("server_port").unwrap(), "9100");
        assert_eq!(sm.get_setting("notification_style").unwrap(), "multi");
        assert_eq!(sm.get_setting("retry_max_attempts").unwrap(), "5");
    }

    #[test]
    fn reset_restores_defaults() {
        let sm = manager();
        sm.set_setting("notification_style", "multi").unwrap();
        sm.set_setting("vapid_enabled", "true").unwrap();
        assert_eq!(sm.reset_to_defaults(&["vapid_enabled".to_string()]).unwrap(), 1);
        assert_eq!(sm.get_setting("vapid_enabled").unwrap(), "false");
        assert_eq!(sm.get_setting("notification_style").unwrap(), "multi");
    }

    #[test]
    fn feature_status_reports_progress() {
        let sm = manager();
        let status = sm.check_feature_status().unwrap();
        assert!(!status.push_registered);
        assert!(!status.style_chosen);

        sm.set_setting("current_distributor", "org.unifiedpush.Distributor.ntfy").unwrap();
        sm.set_setting("current_endpoint", "https://ntfy.sh/up1").unwrap();
        let status = sm.check_feature_status().unwrap();
        assert!(status.push_registered);
        assert!(status.distributor_selected);
    }
}
