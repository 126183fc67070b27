//! The `settings` table: one row per preference key.

use std::collections::HashMap;

use rusqlite::{OptionalExtension, Row, params};

use crate::{Database, DbError};

/// Accepted values of the `setting_type` column.
pub const SETTING_TYPES: [&str; 2] = ["normal", "secret"];

const UPSERT: &str = "INSERT INTO settings (key, value, setting_type, updated_at)
     VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
     ON CONFLICT(key) DO UPDATE
     SET value = excluded.value, setting_type = excluded.setting_type, updated_at = CURRENT_TIMESTAMP";

/// Bulk writes keep whatever type a key already has.
const UPSERT_VALUE: &str = "INSERT INTO settings (key, value, updated_at)
     VALUES (?1, ?2, CURRENT_TIMESTAMP)
     ON CONFLICT(key) DO UPDATE
     SET value = excluded.value, updated_at = CURRENT_TIMESTAMP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceRow {
    pub key: String,
    pub value: String,
    pub setting_type: String,
    pub updated_at: String,
}

impl PreferenceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            value: row.get(1)?,
            setting_type: row.get(2)?,
            updated_at: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        })
    }
}

fn check_key(key: &str) -> Result<(), DbError> {
    if key.trim().is_empty() {
        return Err(DbError::InvalidData("empty preference key".into()));
    }
    Ok(())
}

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        self.read(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    /// Like [`get_setting`](Self::get_setting) but a missing key is an error.
    pub fn require_setting(&self, key: &str) -> Result<String, DbError> {
        self.get_setting(key)?
            .ok_or_else(|| DbError::NotFound(key.to_string()))
    }

    pub fn get_row(&self, key: &str) -> Result<Option<PreferenceRow>, DbError> {
        self.read(|conn| {
            let row = conn
                .query_row(
                    "SELECT key, value, setting_type, updated_at FROM settings WHERE key = ?1",
                    [key],
                    PreferenceRow::from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str, setting_type: &str) -> Result<(), DbError> {
        check_key(key)?;
        if !SETTING_TYPES.contains(&setting_type) {
            return Err(DbError::InvalidData(format!(
                "unknown setting type {setting_type:?} for {key}"
            )));
        }
        self.read(|conn| {
            conn.execute(UPSERT, params![key, value, setting_type])?;
            Ok(())
        })
    }

    pub fn get_all_settings(&self) -> Result<HashMap<String, String>, DbError> {
        self.read(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
            let map = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<HashMap<String, String>>>()?;
            Ok(map)
        })
    }

    /// Write all values in one transaction. New keys are stored as `normal`.
    pub fn update_settings_bulk(&self, settings: &HashMap<String, String>) -> Result<(), DbError> {
        for key in settings.keys() {
            check_key(key)?;
        }
        self.transaction(|tx| {
            let mut stmt = tx.prepare(UPSERT_VALUE)?;
            for (key, value) in settings {
                stmt.execute(params![key, value])?;
            }
            Ok(())
        })
    }

    /// Remove a key. Returns whether it existed.
    pub fn delete_setting(&self, key: &str) -> Result<bool, DbError> {
        self.read(|conn| {
            let removed = conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }
}
