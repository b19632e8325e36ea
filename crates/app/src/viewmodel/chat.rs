//! Chat view model

use parley_core::text::{decode_html, format_timestamp};
use parley_core::Message;

use crate::engine::{SyncSnapshot, SyncStatus};

pub const EMPTY_LOG_TEXT: &str = "No messages yet. Be the first to send one!";
pub const LOADING_TEXT: &str = "Loading messages...";
pub const RETRY_HINT: &str = "Type /retry to try again.";

/// A message prepared for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: String,
    pub author: String,
    pub body: String,
    pub timestamp: String,
    pub is_own: bool,
}

impl MessageView {
    pub fn new(message: &Message, current_user: &str) -> Self {
        Self {
            id: message.id.to_string(),
            author: message.author.clone(),
            body: decode_html(&message.body),
            timestamp: format_timestamp(&message.created_at),
            is_own: message.author == current_user,
        }
    }

    /// Header line plus one line per body line
    pub fn lines(&self) -> Vec<String> {
        let marker = if self.is_own { " (you)" } else { "" };
        let mut lines = vec![format!("{}{} · {}", self.author, marker, self.timestamp)];
        lines.extend(self.body.lines().map(|l| format!("  {}", l)));
        if self.body.is_empty() {
            lines.push(String::from("  "));
        }
        lines
    }
}

/// What the log area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatScreen {
    Loading,
    Error { message: String },
    Empty,
    Messages(Vec<MessageView>),
}

impl ChatScreen {
    pub fn from_snapshot(snapshot: &SyncSnapshot, current_user: &str) -> Self {
        match &snapshot.status {
            SyncStatus::Idle | SyncStatus::Loading => ChatScreen::Loading,
            SyncStatus::LoadError(message) => ChatScreen::Error {
                message: message.clone(),
            },
            SyncStatus::Ready if snapshot.messages.is_empty() => ChatScreen::Empty,
            SyncStatus::Ready => ChatScreen::Messages(
                snapshot
                    .messages
                    .iter()
                    .map(|m| MessageView::new(m, current_user))
                    .collect(),
            ),
        }
    }

    /// Rendered lines of the log area
    pub fn lines(&self) -> Vec<String> {
        match self {
            ChatScreen::Loading => vec![LOADING_TEXT.to_string()],
            ChatScreen::Error { message } => vec![message.clone(), RETRY_HINT.to_string()],
            ChatScreen::Empty => vec![EMPTY_LOG_TEXT.to_string()],
            ChatScreen::Messages(views) => views.iter().flat_map(MessageView::lines).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(status: SyncStatus, messages: Vec<Message>) -> SyncSnapshot {
        SyncSnapshot {
            watermark: messages.last().map(|m| m.created_at),
            status,
            poll_error: false,
            messages,
        }
    }

    fn hello() -> Message {
        Message::new(
            "1",
            "It&#39;s &amp; cool",
            "John",
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_message_view() {
        let ts = format_timestamp(&hello().created_at);
        let view = MessageView::new(&hello(), "John");
        assert_eq!(view.body, "It's & cool");
        assert_eq!(view.timestamp, ts);
        assert!(view.is_own);

        let other = MessageView::new(&hello(), "Ada");
        assert!(!other.is_own);
        assert_eq!(
            other.lines(),
            vec![format!("John · {}", ts), "  It's & cool".to_string()]
        );
    }

    #[test]
    fn test_multiline_body() {
        let mut msg = hello();
        msg.body = "first\nsecond".to_string();
        let lines = MessageView::new(&msg, "John").lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            format!("John (you) · {}", format_timestamp(&msg.created_at))
        );
    }

    #[test]
    fn test_screens() {
        assert_eq!(
            ChatScreen::from_snapshot(&snapshot(SyncStatus::Loading, vec![]), "me"),
            ChatScreen::Loading
        );
        assert_eq!(
            ChatScreen::from_snapshot(&snapshot(SyncStatus::Ready, vec![]), "me"),
            ChatScreen::Empty
        );
        assert_eq!(
            ChatScreen::from_snapshot(
                &snapshot(SyncStatus::LoadError("Unauthorized".into()), vec![]),
                "me"
            )
            .lines(),
            vec!["Unauthorized".to_string(), RETRY_HINT.to_string()]
        );

        let screen = ChatScreen::from_snapshot(&snapshot(SyncStatus::Ready, vec![hello()]), "me");
        assert!(matches!(screen, ChatScreen::Messages(ref v) if v.len() == 1));
        assert_eq!(screen.lines().len(), 2);
    }

    #[test]
    fn test_stale_log_hidden_on_error() {
        let screen = ChatScreen::from_snapshot(
            &snapshot(SyncStatus::LoadError("down".into()), vec![hello()]),
            "me",
        );
        assert_eq!(
            screen,
            ChatScreen::Error {
                message: "down".to_string()
            }
        );
    }
}
