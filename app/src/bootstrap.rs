use std::path::PathBuf;

use prefs_db::Database;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, SettingsManager};
use crate::services::log_buffer::LogCaptureLayer;

pub const DATA_DIR_ENV: &str = "DISCORD_PUSH_DATA_DIR";

/// stderr output plus the in-memory buffer served at `/api/logs`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(LogCaptureLayer::new())
        .init();
}

/// Open the preference store and load runtime config (fatal on error).
pub fn init_foundation() -> Result<(Database, AppConfig, PathBuf), anyhow::Error> {
    load_dotenv();
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    let db_path = dir.join("prefs.db");
    tracing::info!("Opening preference store at {}", db_path.display());
    let db = Database::open(&db_path)?;

    let sm = SettingsManager::new(db.clone());
    match sm.migrate_from_env() {
        Ok(0) => {}
        Ok(n) => tracing::info!("Migrated {n} setting(s) from environment"),
        Err(e) => tracing::error!("Failed to migrate from env: {e}"),
    }
    sm.initialize_defaults()?;

    let config = AppConfig::load(&sm)?;

    if let Ok(status) = sm.check_feature_status() {
        if !status.warnings.is_empty() {
            tracing::warn!(
                "Setup incomplete: missing {:?}, warnings: {:?}",
                status.missing_settings,
                status.warnings
            );
        }
    }

    tracing::info!("Settings loaded (port={})", config.server_port);
    Ok((db, config, dir))
}

/// Data directory: `DISCORD_PUSH_DATA_DIR` or `~/.discord-push`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".discord-push")
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}
