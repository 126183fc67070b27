//! Runtime application configuration loaded from DB + environment overrides.

use std::time::Duration;

use unifiedpush::{QuirkTable, RetryPolicy};

use super::manager::SettingsManager;

const DEFAULT_PORT: u16 = 8737;

/// Runtime configuration populated from the settings DB.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub retry: RetryPolicy,
    pub quirks: QuirkTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            retry: RetryPolicy::default(),
            quirks: QuirkTable::builtin(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the settings manager (DB-first, env overrides).
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };
        let defaults = RetryPolicy::default();

        let mut server_port = parse_u16(&g("server_port"), DEFAULT_PORT);
        if let Ok(v) = std::env::var("SERVER_PORT") {
            if let Ok(p) = v.parse::<u16>() {
                server_port = p;
            }
        }

        let base_delay = parse_u64(&g("retry_base_delay_ms"), defaults.base_delay.as_millis() as u64);
        let max_delay = parse_u64(&g("retry_max_delay_ms"), defaults.max_delay.as_millis() as u64);
        let retry = RetryPolicy {
            max_attempts: parse_u32(&g("retry_max_attempts"), defaults.max_attempts),
            base_delay: Duration::from_millis(base_delay),
            max_delay: Duration::from_millis(max_delay.max(base_delay)),
        };

        let quirks_json = g("distributor_quirks");
        let quirks = if quirks_json.trim().is_empty() {
            QuirkTable::builtin()
        } else {
            match QuirkTable::from_json(&quirks_json) {
                Ok(table) => table,
                Err(e) => {
                    tracing::warn!("Invalid distributor_quirks, using built-in table: {e}");
                    QuirkTable::builtin()
                }
            }
        };

        Ok(Self {
            server_port,
            retry,
            quirks,
        })
    }

    /// Reload config from the settings manager.
    pub fn reload(&mut self, sm: &SettingsManager) -> Result<(), anyhow::Error> {
        *self = Self::load(sm)?;
        Ok(())
    }
}

fn parse_u16(s: &str, default: u16) -> u16 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_u32(s: &str, default: u32) -> u32 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}
