//! Parley Network Library
//!
//! HTTP transport for the chat message API.
//!
//! # Architecture
//!
//! - **MessageTransport**: the two operations the sync engine needs
//! - **HttpClient**: reqwest implementation with bearer auth
//! - **Error**: failures normalized to the API's `{message, statusCode}` shape
//!
//! # Usage
//!
//! ```ignore
//! let client = HttpClient::new("http://localhost:3000", "token", Duration::from_secs(10))?;
//!
//! let latest = client.list_messages(&MessageQuery::latest(100)).await?;
//! let sent = client
//!     .create_message(&NewMessage { body: "hi".into(), author: "Ada".into() })
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod transport;

pub use client::HttpClient;
pub use error::{ApiError, Error, Result};
pub use transport::MessageTransport;
