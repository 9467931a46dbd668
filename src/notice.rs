// Notice module - user-visible messages (the console's toast surface)
//
// Library code pushes notices here instead of printing; the CLI drains the
// buffer after every command and renders what accumulated. The buffer is
// bounded so a long-running shell never grows without limit.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Maximum number of notices kept before the oldest is dropped
const MAX_NOTICES: usize = 100;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    /// Get the display string for this level
    pub fn as_str(&self) -> &str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// A single user-visible message
#[derive(Debug, Clone)]
pub struct Notice {
    pub timestamp: DateTime<Utc>,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// Bounded in-memory notice buffer, shared by clone
#[derive(Clone, Default)]
pub struct NoticeBuffer {
    entries: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notice, evicting the oldest one when full
    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= MAX_NOTICES {
            entries.pop_front();
        }
        entries.push_back(Notice::new(level, message));
    }

    /// Remove and return all pending notices (oldest first)
    pub fn drain(&self) -> Vec<Notice> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Copy of all pending notices without consuming them
    pub fn snapshot(&self) -> Vec<Notice> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_in_order_and_empties() {
        let notices = NoticeBuffer::new();
        notices.push(NoticeLevel::Info, "first");
        notices.push(NoticeLevel::Warning, "second");

        let drained = notices.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "first");
        assert_eq!(drained[1].level, NoticeLevel::Warning);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_buffer_is_bounded() {
        let notices = NoticeBuffer::new();
        for i in 0..(MAX_NOTICES + 5) {
            notices.push(NoticeLevel::Info, format!("n{}", i));
        }

        let all = notices.snapshot();
        assert_eq!(all.len(), MAX_NOTICES);
        assert_eq!(all[0].message, "n5");
    }

    #[test]
    fn test_clones_share_entries() {
        let notices = NoticeBuffer::new();
        let other = notices.clone();
        other.push(NoticeLevel::Error, "shared");
        assert_eq!(notices.len(), 1);
    }
}
