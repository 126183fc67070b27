//! Database schema definitions and migrations.

use rusqlite::Connection;

use crate::DbError;

pub fn run_migrations(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(SCHEMA)?;
    migrate_legacy_notification_style(conn)?;
    Ok(())
}

/// Older builds stored the style as an integer code, and had a `single`
/// variant that now behaves as `hybrid`.
fn migrate_legacy_notification_style(conn: &Connection) -> Result<(), DbError> {
    let current: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = 'notification_style'",
            [],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    let Some(current) = current else {
        return Ok(());
    };

    let Some(replacement) = legacy_style_replacement(&current) else {
        return Ok(());
    };

    tracing::info!(from = %current, to = replacement, "Migrating legacy notification style");
    conn.execute(
        "UPDATE settings SET value = ?1, updated_at = CURRENT_TIMESTAMP WHERE key = 'notification_style'",
        [replacement],
    )?;
    Ok(())
}

fn legacy_style_replacement(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "single" | "0" | "2" => Some("hybrid"),
        "1" => Some("multi"),
        _ => None,
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    setting_type TEXT NOT NULL DEFAULT 'normal',
    is_required BOOLEAN NOT NULL DEFAULT false,
    description TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;
