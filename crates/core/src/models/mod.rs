//! Data models for Parley

mod display_name;
mod message;

pub use display_name::*;
pub use message::*;
