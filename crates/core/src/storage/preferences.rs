//! User preferences persistence
//!
//! Plain key/value rows; the display name is the only key in use today.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::storage::parse::OptionalExt;
use crate::storage::traits::NameStore;

/// Preferences store
pub struct PreferencesStore<'a> {
    conn: &'a Connection,
}

impl<'a> PreferencesStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Load a preference value
    pub fn load(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Save a preference value (upsert)
    pub fn save(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl NameStore for PreferencesStore<'_> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.load(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.save(key, value)
    }
}
