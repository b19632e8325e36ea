//! Message transport abstraction

use async_trait::async_trait;
use parley_core::{Message, MessageQuery, NewMessage};

use crate::error::Result;

/// The two REST operations the chat client depends on
///
/// Implementations must return list results in ascending `created_at` order.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// `GET /messages` with optional `limit` / `after` / `before`
    async fn list_messages(&self, query: &MessageQuery) -> Result<Vec<Message>>;

    /// `POST /messages`, returning the server's canonical record
    async fn create_message(&self, payload: &NewMessage) -> Result<Message>;
}
