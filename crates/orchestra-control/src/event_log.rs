use chrono::{DateTime, Local};
use std::collections::VecDeque;

pub const DEFAULT_DISPLAY: usize = 5;
pub const DEFAULT_RETENTION: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

/// Operator-facing history, newest first. Entries past `retention` fall off
/// the back.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<EventEntry>,
    retention: usize,
}

impl EventLog {
    pub fn new(retention: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            retention: retention.max(1),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push_front(EventEntry {
            at: Local::now(),
            message: message.into(),
        });
        self.entries.truncate(self.retention);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&EventEntry> {
        self.entries.front()
    }

    pub fn window(&self, offset: usize, limit: usize) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter().skip(offset).take(limit)
    }

    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.message.as_str()).collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}
