//! Notification log.
//!
//! Append-only, newest-first, uncapped. Entries are informational, so there
//! is no suppression window: every crossing the policy reports is kept.
//!
//! # Clock injection
//! `append_at` takes the current instant rather than calling `Utc::now()`
//! so ids stay deterministic in tests.

use std::collections::VecDeque;

use chrono::{DateTime, Local, Utc};

use crate::logging::{self, Component};
use crate::model::NotificationEntry;

/// Formats an instant the way the dashboard shows it, in local time.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: VecDeque<NotificationEntry>,
    last_id: u64,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted log. `entries` must already be newest-first.
    pub fn from_entries(entries: Vec<NotificationEntry>) -> Self {
        let last_id = entries.iter().map(|e| e.id).max().unwrap_or(0);
        Self {
            entries: entries.into(),
            last_id,
        }
    }

    /// Appends a message stamped with `now` and returns the stored entry.
    ///
    /// Ids are epoch milliseconds; two appends in the same millisecond get
    /// consecutive ids instead of colliding. Once `u64::MAX` is reached the
    /// id stays there.
    pub fn append_at(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> NotificationEntry {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last_id.saturating_add(1));
        self.last_id = id;

        let entry = NotificationEntry {
            id,
            message: message.into(),
            timestamp: format_timestamp(now),
        };
        logging::info(Component::Alert, None, &entry.message);
        self.entries.push_front(entry.clone());
        entry
    }

    /// Removes a single entry. Returns `false` if no entry had that id.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&NotificationEntry> {
        self.entries.front()
    }

    pub fn to_vec(&self) -> Vec<NotificationEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
