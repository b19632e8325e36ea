//! Message log synchronization state machine
//!
//! Pure state: no I/O and no timers. The sync task asks the engine what to
//! fetch (`begin_*`), performs the request, and hands the outcome back
//! (`finish_*` / `apply_sent`). Each call returns the events the render
//! layer should see.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use parley_core::invariants::assert_log_invariants;
use parley_core::{Message, MessageId, MessageQuery};
use tracing::{debug, info, warn};

/// Shown when a load failure carries no readable message
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load messages";

/// Lifecycle of the message log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing fetched yet
    Idle,
    /// Full load in flight
    Loading,
    /// Log populated, polling active
    Ready,
    /// Full load failed; polling inactive until a retry succeeds
    LoadError(String),
}

/// Events for the render layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    StatusChanged(SyncStatus),
    /// Full load replaced the log; jump to the end without animation
    Loaded { count: usize },
    /// A poll appended newer messages; scroll only if the reader is at the end
    NewMessages { count: usize },
    /// A send was confirmed by the server; scroll smoothly to the end
    Sent(Message),
    /// The quiet poll-failure indicator changed
    PollHealth { failing: bool },
}

/// Read-only copy of the engine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub status: SyncStatus,
    pub poll_error: bool,
    pub messages: Vec<Message>,
    pub watermark: Option<DateTime<Utc>>,
}

/// Owner of the message log and its watermark
#[derive(Debug)]
pub struct SyncEngine {
    status: SyncStatus,
    log: Vec<Message>,
    known_ids: HashSet<MessageId>,
    watermark: Option<DateTime<Utc>>,
    poll_error: bool,
    poll_in_flight: bool,
    initial_limit: u32,
    poll_limit: u32,
}

impl SyncEngine {
    pub fn new(initial_limit: u32, poll_limit: u32) -> Self {
        Self {
            status: SyncStatus::Idle,
            log: Vec::new(),
            known_ids: HashSet::new(),
            watermark: None,
            poll_error: false,
            poll_in_flight: false,
            initial_limit,
            poll_limit,
        }
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    #[cfg(test)]
    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    #[cfg(test)]
    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        self.watermark
    }

    #[cfg(test)]
    pub fn poll_error(&self) -> bool {
        self.poll_error
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            status: self.status.clone(),
            poll_error: self.poll_error,
            messages: self.log.clone(),
            watermark: self.watermark,
        }
    }

    /// `Idle -> Loading`; returns the full-load query
    pub fn begin_initialize(&mut self) -> Option<MessageQuery> {
        match self.status {
            SyncStatus::Idle => Some(self.start_loading()),
            _ => {
                debug!(status = ?self.status, "Ignoring initialize outside Idle");
                None
            }
        }
    }

    /// `LoadError -> Loading`; returns the full-load query
    pub fn begin_retry(&mut self) -> Option<MessageQuery> {
        match self.status {
            SyncStatus::LoadError(_) => Some(self.start_loading()),
            _ => {
                debug!(status = ?self.status, "Ignoring retry outside LoadError");
                None
            }
        }
    }

    fn start_loading(&mut self) -> MessageQuery {
        self.status = SyncStatus::Loading;
        MessageQuery::latest(self.initial_limit)
    }

    /// Apply the result of a full load
    pub fn finish_load<E>(&mut self, result: Result<Vec<Message>, E>) -> Vec<SyncEvent>
    where
        E: LoadFailure,
    {
        if self.status != SyncStatus::Loading {
            debug!("Dropping load result that arrived outside Loading");
            return Vec::new();
        }

        match result {
            Ok(mut messages) => {
                messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));

                self.log.clear();
                self.known_ids.clear();
                self.watermark = None;
                self.poll_error = false;
                self.poll_in_flight = false;
                let count = self.merge(messages);

                self.status = SyncStatus::Ready;
                info!(count, "Message log loaded");
                vec![
                    SyncEvent::StatusChanged(SyncStatus::Ready),
                    SyncEvent::Loaded { count },
                ]
            }
            Err(e) => {
                let message = e.load_message();
                warn!(error = %message, "Failed to load messages");
                self.status = SyncStatus::LoadError(message);
                vec![SyncEvent::StatusChanged(self.status.clone())]
            }
        }
    }

    /// Incremental query for the next tick, if a poll should run now
    ///
    /// Returns `None` outside `Ready`, before anything has loaded, or while
    /// the previous poll is unresolved.
    pub fn begin_poll(&mut self) -> Option<MessageQuery> {
        if self.status != SyncStatus::Ready {
            return None;
        }
        let watermark = self.watermark?;
        if self.poll_in_flight {
            debug!("Previous poll still in flight, skipping tick");
            return None;
        }
        self.poll_in_flight = true;
        Some(MessageQuery::after(watermark, self.poll_limit))
    }

    /// Apply the result of an incremental poll
    pub fn finish_poll<E>(&mut self, result: Result<Vec<Message>, E>) -> Vec<SyncEvent>
    where
        E: std::fmt::Display,
    {
        let was_in_flight = std::mem::replace(&mut self.poll_in_flight, false);
        if !was_in_flight || self.status != SyncStatus::Ready {
            debug!("Dropping stale poll result");
            return Vec::new();
        }

        let mut events = Vec::new();
        match result {
            Ok(messages) => {
                if self.poll_error {
                    self.poll_error = false;
                    info!("Polling recovered");
                    events.push(SyncEvent::PollHealth { failing: false });
                }
                let count = self.merge(messages);
                if count > 0 {
                    debug!(count, "Poll delivered new messages");
                    events.push(SyncEvent::NewMessages { count });
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to poll new messages");
                if !self.poll_error {
                    self.poll_error = true;
                    events.push(SyncEvent::PollHealth { failing: true });
                }
            }
        }
        events
    }

    /// Append a server-confirmed message from a send
    pub fn apply_sent(&mut self, message: Message) -> Vec<SyncEvent> {
        if self.merge(vec![message.clone()]) == 0 {
            debug!(id = %message.id, "Sent message already in log");
        }
        vec![SyncEvent::Sent(message)]
    }

    /// Add messages, skipping known ids; returns how many were accepted
    ///
    /// Arrivals older than the current tail are placed by timestamp so the
    /// log stays chronological and the watermark stays the tail's timestamp.
    fn merge(&mut self, messages: Vec<Message>) -> usize {
        let mut accepted = 0;
        for message in messages {
            if !self.known_ids.insert(message.id.clone()) {
                debug!(id = %message.id, "Skipping duplicate message");
                continue;
            }
            let in_order = self
                .log
                .last()
                .map_or(true, |last| last.created_at <= message.created_at);
            if in_order {
                self.log.push(message);
            } else {
                let at = self
                    .log
                    .partition_point(|m| m.created_at <= message.created_at);
                self.log.insert(at, message);
            }
            accepted += 1;
        }

        self.watermark = self.log.last().map(|m| m.created_at);
        assert_log_invariants(&self.log, self.watermark);
        accepted
    }
}

/// Failures that can end a full load
pub trait LoadFailure: std::fmt::Display {
    /// Text shown on the load error screen
    fn load_message(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            LOAD_FAILED_MESSAGE.to_string()
        } else {
            text
        }
    }
}

impl LoadFailure for parley_net::Error {
    fn load_message(&self) -> String {
        self.message_or(LOAD_FAILED_MESSAGE)
    }
}
