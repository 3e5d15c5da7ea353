//! Live event log
//!
//! Bounded, most-recent-first log of push-channel messages. JSON payloads
//! are pretty-printed; anything that fails to parse is kept as raw text.

use crate::{Error, Result};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

/// Default number of entries kept
pub const DEFAULT_MAX_ENTRIES: usize = 20;

/// One line (or block) of the log
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// Connection lifecycle message ("WS connected", ...)
    Status(String),
    /// Parsed JSON message
    Event(Value),
    /// Message that was not valid JSON
    Raw(String),
}

impl LogEntry {
    /// Text as displayed
    pub fn render(&self) -> String {
        match self {
            LogEntry::Status(s) | LogEntry::Raw(s) => s.clone(),
            // JSON strings display unquoted
            LogEntry::Event(Value::String(s)) => s.clone(),
            LogEntry::Event(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
        }
    }
}

/// Parse a push message as JSON
pub fn parse_message(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::StreamMessageParse(e.to_string()))
}

/// Capped most-recent-first log
#[derive(Debug, Clone)]
pub struct LiveEventLog {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
}

impl Default for LiveEventLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl LiveEventLog {
    /// A log holding at most `max_entries` (at least one)
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Record an incoming message. Never fails: unparseable input is kept verbatim.
    pub fn push_message(&mut self, raw: &str) -> &LogEntry {
        let entry = match parse_message(raw) {
            Ok(value) => LogEntry::Event(value),
            Err(e) => {
                debug!("Showing raw stream message: {}", e);
                LogEntry::Raw(raw.to_string())
            }
        };
        self.push(entry)
    }

    /// Record a connection status line
    pub fn push_status(&mut self, status: impl Into<String>) -> &LogEntry {
        self.push(LogEntry::Status(status.into()))
    }

    fn push(&mut self, entry: LogEntry) -> &LogEntry {
        self.entries.push_front(entry);
        self.entries.truncate(self.max_entries);
        &self.entries[0]
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Rendered entries, newest first
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(LogEntry::render).collect()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
