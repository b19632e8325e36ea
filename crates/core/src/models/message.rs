//! Message model for the chat log

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned message identifier (opaque)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A chat message as delivered by the server
///
/// Field names on the wire follow the REST API (`_id`, `message`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,
    #[serde(rename = "message")]
    pub body: String,
    pub author: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        body: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            author: author.into(),
            created_at,
        }
    }
}

/// Payload for creating a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    #[serde(rename = "message")]
    pub body: String,
    pub author: String,
}

/// Filter for listing messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    pub limit: Option<u32>,
    /// Exclusive lower bound on `created_at`
    pub after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub before: Option<DateTime<Utc>>,
}

impl MessageQuery {
    /// Most recent `limit` messages, no time bounds
    pub fn latest(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Messages strictly newer than `watermark`, capped at `limit`
    pub fn after(watermark: DateTime<Utc>, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            after: Some(watermark),
            before: None,
        }
    }

    /// Query string pairs in wire order (`limit`, `after`, `before`)
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(after) = self.after {
            pairs.push(("after", format_wire_timestamp(after)));
        }
        if let Some(before) = self.before {
            pairs.push(("before", format_wire_timestamp(before)));
        }
        pairs
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix, as the API emits
pub fn format_wire_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
