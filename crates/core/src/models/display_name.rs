//! Display name used to stamp outgoing messages

use tracing::warn;

use crate::error::Result;
use crate::storage::NameStore;
use crate::validation::validate_display_name;

/// Fixed preference key for the display name
pub const DISPLAY_NAME_KEY: &str = "chat_app_user";

/// Name used when nothing has been stored yet
pub const DEFAULT_DISPLAY_NAME: &str = "anonymous";

/// The local user's chosen name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// Load the stored name, falling back to the default
    pub fn load(store: &dyn NameStore) -> Self {
        match store.get(DISPLAY_NAME_KEY) {
            Ok(Some(name)) if !name.trim().is_empty() => Self(name),
            Ok(_) => Self::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read display name, using default");
                Self::default()
            }
        }
    }

    /// Validate, persist and return the new name
    pub fn save(store: &dyn NameStore, name: &str) -> Result<Self> {
        let name = validate_display_name(name)?;
        store.set(DISPLAY_NAME_KEY, &name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DisplayName {
    fn default() -> Self {
        Self(DEFAULT_DISPLAY_NAME.to_string())
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
