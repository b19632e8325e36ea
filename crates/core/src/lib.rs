//! Parley Core Library
//!
//! Message models, input validation, configuration and preference storage
//! for the Parley chat client.

pub mod config;
pub mod error;
pub mod invariants;
pub mod models;
pub mod storage;
pub mod text;
pub mod validation;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::*;
pub use storage::{Database, MemoryNameStore, NameStore, PreferencesStore};
pub use validation::{
    validate_display_name, validate_outgoing, CharCount, CountLevel, ValidationError,
    MAX_AUTHOR_LENGTH, MAX_MESSAGE_LENGTH,
};
