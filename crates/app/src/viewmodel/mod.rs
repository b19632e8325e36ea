//! View models for the terminal front-end

mod chat;
mod composer;
mod username;
mod viewport;

pub use chat::ChatScreen;
pub use composer::Composer;
pub use username::UsernameEditor;
pub use viewport::{directive_for, ScrollDirective, Viewport};
