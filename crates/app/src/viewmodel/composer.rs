//! Message composer view model
//!
//! Holds the draft between keystrokes. Submitting is split in two so the
//! caller can await the send without blocking rendering: `begin_submit`
//! validates and marks the composer busy, `finish_submit` applies the
//! server's answer.

use parley_core::{
    validate_outgoing, CharCount, DisplayName, Message, NameStore, NewMessage,
};
use tracing::warn;

use crate::sync::SendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composer {
    body: String,
    author: String,
    sending: bool,
    error: Option<String>,
}

impl Composer {
    /// Empty draft with the author pre-filled
    pub fn new(author: &DisplayName) -> Self {
        Self {
            body: String::new(),
            author: author.as_str().to_string(),
            sending: false,
            error: None,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    #[cfg(test)]
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Inline error under the composer
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.error = None;
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
        self.error = None;
    }

    pub fn char_count(&self) -> CharCount {
        CharCount::for_body(&self.body)
    }

    /// Whether the send affordance is enabled
    pub fn can_submit(&self) -> bool {
        !self.sending
            && !self.body.trim().is_empty()
            && !self.author.trim().is_empty()
            && !self.char_count().is_over()
    }

    /// Validate the draft; on success the composer is busy until
    /// [`Composer::finish_submit`]
    pub fn begin_submit(&mut self) -> Option<NewMessage> {
        if self.sending {
            return None;
        }
        match validate_outgoing(&self.body, &self.author) {
            Ok(payload) => {
                self.error = None;
                self.sending = true;
                Some(payload)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Apply the send result
    ///
    /// On success the body is cleared and the author becomes the stored
    /// display name (returned). On failure the draft is kept for resubmission.
    pub fn finish_submit(
        &mut self,
        result: Result<Message, SendError>,
        names: &dyn NameStore,
    ) -> Option<DisplayName> {
        self.sending = false;
        match result {
            Ok(_) => {
                self.body.clear();
                match DisplayName::save(names, &self.author) {
                    Ok(name) => {
                        self.author = name.as_str().to_string();
                        Some(name)
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to save display name");
                        None
                    }
                }
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_core::{MemoryNameStore, DISPLAY_NAME_KEY};

    fn composer() -> Composer {
        Composer::new(&DisplayName::default())
    }

    #[test]
    fn test_prefilled_author() {
        let c = composer();
        assert_eq!(c.author(), "anonymous");
        assert!(!c.can_submit());
    }

    #[test]
    fn test_empty_draft_rejected_locally() {
        let mut c = composer();
        c.set_body("   ");
        assert!(c.begin_submit().is_none());
        assert_eq!(c.error(), Some("Please enter both message and author name"));
        assert!(!c.is_sending());

        // Editing clears the error
        c.set_body("hi");
        assert_eq!(c.error(), None);
    }

    #[test]
    fn test_too_long_draft() {
        let mut c = composer();
        c.set_body("x".repeat(1001));
        assert!(!c.can_submit());
        assert!(c.begin_submit().is_none());
        assert_eq!(c.error(), Some("Message is too long (max 1000 characters)"));
    }

    #[test]
    fn test_busy_while_sending() {
        let mut c = composer();
        c.set_body(" hello ");
        let payload = c.begin_submit().unwrap();
        assert_eq!(payload.body, "hello");
        assert!(c.is_sending());
        assert!(!c.can_submit());
        assert!(c.begin_submit().is_none());
    }

    #[test]
    fn test_success_clears_body_and_saves_author() {
        let store = MemoryNameStore::default();
        let mut c = composer();
        c.set_author(" Ada ");
        c.set_body("hello");
        c.begin_submit().unwrap();

        let echoed = Message::new("1", "hello", "Ada", Utc::now());
        let name = c.finish_submit(Ok(echoed), &store).unwrap();

        assert_eq!(name.as_str(), "Ada");
        assert_eq!(c.body(), "");
        assert_eq!(c.author(), "Ada");
        assert!(!c.is_sending());
        assert_eq!(store.get(DISPLAY_NAME_KEY).unwrap(), Some("Ada".to_string()));
    }

    #[test]
    fn test_failure_keeps_draft() {
        let store = MemoryNameStore::default();
        let mut c = composer();
        c.set_body("hello");
        c.begin_submit().unwrap();

        let err = SendError::Transport(parley_net::Error::api("Service Unavailable", 503));
        assert!(c.finish_submit(Err(err), &store).is_none());

        assert_eq!(c.body(), "hello");
        assert_eq!(c.error(), Some("Service Unavailable"));
        assert!(c.can_submit());
        assert_eq!(store.get(DISPLAY_NAME_KEY).unwrap(), None);
    }
}
