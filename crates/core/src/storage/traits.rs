//! Storage traits
//!
//! The display name lives behind a tiny key/value interface so the app can
//! run against SQLite or an in-memory map.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;

/// Synchronous key/value store for user preferences
pub trait NameStore {
    /// Read a value; `None` when the key was never set
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store (tests, ephemeral sessions)
#[derive(Debug, Default)]
pub struct MemoryNameStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryNameStore {
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl NameStore for MemoryNameStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
