//! Developer guardrails for the message log
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::Message;

/// True when `created_at` never decreases along the log
pub fn is_chronological(log: &[Message]) -> bool {
    log.windows(2).all(|w| w[0].created_at <= w[1].created_at)
}

/// True when no two entries share an id
pub fn has_unique_ids(log: &[Message]) -> bool {
    let mut seen = HashSet::with_capacity(log.len());
    log.iter().all(|m| seen.insert(&m.id))
}

/// Validate the log ordering, id uniqueness and its watermark
pub fn assert_log_invariants(log: &[Message], watermark: Option<DateTime<Utc>>) {
    debug_assert!(is_chronological(log), "Message log is out of order");

    debug_assert!(has_unique_ids(log), "Message log contains duplicate ids");

    debug_assert_eq!(
        watermark,
        log.last().map(|m| m.created_at),
        "Watermark does not match the last message"
    );
}
