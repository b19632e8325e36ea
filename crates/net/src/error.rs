//! Transport error types
//!
//! Non-2xx responses carry the API's `{message, statusCode}` body; every other
//! failure is reduced to a display message and an optional status.

use serde::{Deserialize, Serialize};

/// Transport result type
pub type Result<T> = std::result::Result<T, Error>;

/// Message used when a failure carries no readable text
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Message used when an error response body cannot be parsed
pub const GENERIC_API_ERROR_MESSAGE: &str = "An error occurred";

/// Error body returned by the API for non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Server answered with a non-2xx status
    #[error("{0}")]
    Api(ApiError),

    /// Request never produced a response (DNS, refused, timeout, ...)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 2xx response whose body was not the expected JSON
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidBaseUrl(String),
}

impl Error {
    pub fn api(message: impl Into<String>, status_code: u16) -> Self {
        Error::Api(ApiError {
            message: message.into(),
            status_code: Some(status_code),
        })
    }

    /// HTTP status, when the failure came with one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(api) => api.status_code,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::Decode(_) | Error::InvalidBaseUrl(_) => None,
        }
    }

    /// Human-readable text for the user
    pub fn display_message(&self) -> String {
        let text = match self {
            Error::Api(api) => api.message.clone(),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            UNEXPECTED_ERROR_MESSAGE.to_string()
        } else {
            text
        }
    }

    /// Human-readable text with a caller-chosen fallback for empty messages
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Error::Api(api) if api.message.trim().is_empty() => fallback.to_string(),
            _ => self.display_message(),
        }
    }
}
