//! Session log
//!
//! Append-only, categorized, timestamped record of all notable session
//! events, exposed to the display layer in arrival order. Arrival order is
//! the only defined order across the request/response and push channels.
//! Not persisted; cleared only by explicit operator action.

use chrono::{DateTime, Local};

/// Log entry category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// General session information and command results
    Info,
    /// Asynchronously pushed inbound device data
    Incoming,
    /// Command frames written to a device
    Outgoing,
    /// Recovered failures
    Error,
}

impl LogCategory {
    /// Short tag for rendering
    pub fn tag(&self) -> &'static str {
        match self {
            LogCategory::Info => "info",
            LogCategory::Incoming => "recv",
            LogCategory::Outgoing => "send",
            LogCategory::Error => "error",
        }
    }
}

/// One session log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub category: LogCategory,
    pub message: String,
}

impl LogEntry {
    /// Timestamp formatted with millisecond resolution
    pub fn timestamp_display(&self) -> String {
        self.timestamp.format("%H:%M:%S%.3f").to_string()
    }
}

/// Append-only session record
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a timestamped entry in arrival order
    pub fn append(&mut self, category: LogCategory, message: impl Into<String>) {
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            category,
            message: message.into(),
        });
    }

    /// Reset to empty. Touches nothing but the log itself.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut log = SessionLog::new();
        log.append(LogCategory::Info, "first");
        log.append(LogCategory::Outgoing, "second");
        log.append(LogCategory::Incoming, "third");

        let messages: Vec<&str> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert!(log.entries()[0].timestamp <= log.entries()[2].timestamp);
    }

    #[test]
    fn test_clear() {
        let mut log = SessionLog::new();
        log.append(LogCategory::Error, "boom");
        assert_eq!(log.len(), 1);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_category_tags() {
        assert_eq!(LogCategory::Incoming.tag(), "recv");
        assert_eq!(LogCategory::Outgoing.tag(), "send");
    }
}
