//! Display name editor

use parley_core::{validate_display_name, DisplayName, NameStore, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameEditor {
    current: DisplayName,
    editing: bool,
    value: String,
}

impl UsernameEditor {
    pub fn new(current: DisplayName) -> Self {
        let value = current.as_str().to_string();
        Self {
            current,
            editing: false,
            value,
        }
    }

    pub fn current(&self) -> &DisplayName {
        &self.current
    }

    #[cfg(test)]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    #[cfg(test)]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Enter edit mode with the current name as the value
    pub fn begin_edit(&mut self) {
        self.editing = true;
        self.value = self.current.as_str().to_string();
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Persist the edited value; `Ok(false)` when it was rejected and the
    /// editor stays open
    pub fn save(&mut self, store: &dyn NameStore) -> Result<bool> {
        if validate_display_name(&self.value).is_err() {
            return Ok(false);
        }
        self.current = DisplayName::save(store, &self.value)?;
        self.value = self.current.as_str().to_string();
        self.editing = false;
        Ok(true)
    }

    /// Leave edit mode, restoring the current name
    pub fn cancel(&mut self) {
        self.value = self.current.as_str().to_string();
        self.editing = false;
    }

    /// Adopt a name saved elsewhere (after a send)
    pub fn sync_current(&mut self, name: DisplayName) {
        self.current = name;
        if !self.editing {
            self.value = self.current.as_str().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{MemoryNameStore, DISPLAY_NAME_KEY};

    #[test]
    fn test_loads_stored_name() {
        let store = MemoryNameStore::with_value(DISPLAY_NAME_KEY, "Grace");
        let editor = UsernameEditor::new(DisplayName::load(&store));
        assert_eq!(editor.current().as_str(), "Grace");
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_edit_and_save() {
        let store = MemoryNameStore::default();
        let mut editor = UsernameEditor::new(DisplayName::load(&store));
        assert_eq!(editor.current().as_str(), "anonymous");

        editor.begin_edit();
        assert_eq!(editor.value(), "anonymous");
        editor.set_value("  Ada Lovelace ");
        assert!(editor.save(&store).unwrap());

        assert!(!editor.is_editing());
        assert_eq!(editor.current().as_str(), "Ada Lovelace");
        assert_eq!(
            store.get(DISPLAY_NAME_KEY).unwrap(),
            Some("Ada Lovelace".to_string())
        );
    }

    #[test]
    fn test_invalid_value_keeps_editing() {
        let store = MemoryNameStore::default();
        let mut editor = UsernameEditor::new(DisplayName::load(&store));
        editor.begin_edit();

        editor.set_value("   ");
        assert!(!editor.save(&store).unwrap());
        assert!(editor.is_editing());

        editor.set_value("a".repeat(101));
        assert!(!editor.save(&store).unwrap());
        assert_eq!(store.get(DISPLAY_NAME_KEY).unwrap(), None);
    }

    #[test]
    fn test_cancel_restores() {
        let store = MemoryNameStore::default();
        let mut editor = UsernameEditor::new(DisplayName::load(&store));
        editor.begin_edit();
        editor.set_value("Someone");
        editor.cancel();

        assert!(!editor.is_editing());
        assert_eq!(editor.value(), "anonymous");
        assert_eq!(editor.current().as_str(), "anonymous");
    }
}
