//! Application state management

use parley_core::config::data_dir;
use parley_core::{ClientConfig, Database, DisplayName, Result};

/// Main application state
pub struct AppState {
    pub config: ClientConfig,
    pub db: Database,
}

impl AppState {
    /// Open the preferences database in the platform data directory
    pub fn new(config: ClientConfig) -> Result<Self> {
        let db = Database::open(&data_dir()?.join("parley.db"))?;
        Ok(Self { config, db })
    }

    #[cfg(test)]
    pub fn in_memory(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            config,
            db: Database::open_in_memory()?,
        })
    }

    /// Stored display name, `anonymous` when none is saved
    pub fn display_name(&self) -> DisplayName {
        DisplayName::load(&self.db)
    }
}
