//! Local input validation for outgoing messages and display names
//!
//! Everything here runs before the network is touched.

use thiserror::Error;

use crate::models::NewMessage;

/// Maximum message body length, in characters
pub const MAX_MESSAGE_LENGTH: usize = 1000;

/// Maximum author / display name length, in characters
pub const MAX_AUTHOR_LENGTH: usize = 100;

/// Counter turns to a warning above this share of the limit
const WARNING_RATIO: f64 = 0.9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter both message and author name")]
    Empty,

    #[error("Message is too long (max {max} characters)")]
    BodyTooLong { max: usize },

    #[error("Author name is too long (max {max} characters)")]
    AuthorTooLong { max: usize },

    #[error("Display name must be 1 to {max} characters")]
    InvalidDisplayName { max: usize },
}

/// Validate a composed message and return the trimmed payload
///
/// Length limits apply to the text as typed, the payload carries it trimmed.
pub fn validate_outgoing(body: &str, author: &str) -> Result<NewMessage, ValidationError> {
    if body.trim().is_empty() || author.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    if body.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::BodyTooLong {
            max: MAX_MESSAGE_LENGTH,
        });
    }

    if author.chars().count() > MAX_AUTHOR_LENGTH {
        return Err(ValidationError::AuthorTooLong {
            max: MAX_AUTHOR_LENGTH,
        });
    }

    Ok(NewMessage {
        body: body.trim().to_string(),
        author: author.trim().to_string(),
    })
}

/// Validate a display name, returning it trimmed
pub fn validate_display_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_AUTHOR_LENGTH {
        return Err(ValidationError::InvalidDisplayName {
            max: MAX_AUTHOR_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

/// Severity of a character counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountLevel {
    Normal,
    Warning,
    Over,
}

/// Character counter for the composer (`len/max`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCount {
    pub len: usize,
    pub max: usize,
}

impl CharCount {
    pub fn for_body(body: &str) -> Self {
        Self {
            len: body.chars().count(),
            max: MAX_MESSAGE_LENGTH,
        }
    }

    pub fn level(&self) -> CountLevel {
        if self.len > self.max {
            CountLevel::Over
        } else if self.len as f64 > self.max as f64 * WARNING_RATIO {
            CountLevel::Warning
        } else {
            CountLevel::Normal
        }
    }

    pub fn is_over(&self) -> bool {
        self.level() == CountLevel::Over
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.len, self.max)
    }
}
