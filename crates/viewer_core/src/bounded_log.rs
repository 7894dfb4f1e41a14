use std::collections::{vec_deque, VecDeque};

use chrono::{DateTime, Local};

pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Short badge shown in front of every rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryTag {
    Movement,
    Obstacle,
    DemoSequence,
    Generic,
}

impl EntryTag {
    pub fn badge(self) -> &'static str {
        match self {
            EntryTag::Movement => "MOV",
            EntryTag::Obstacle => "OBS",
            EntryTag::DemoSequence => "DEMO",
            EntryTag::Generic => "WS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    tag: EntryTag,
    label: String,
    displayed_at: DateTime<Local>,
}

impl LogEntry {
    pub fn new(tag: EntryTag, label: impl Into<String>, displayed_at: DateTime<Local>) -> Self {
        Self {
            tag,
            label: label.into(),
            displayed_at,
        }
    }

    pub fn tag(&self) -> EntryTag {
        self.tag
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wall-clock time the entry was inserted, not when the event happened.
    pub fn displayed_at(&self) -> DateTime<Local> {
        self.displayed_at
    }
}

/// Most-recent-first list with a fixed capacity. New entries go to the
/// head; once full, the oldest entry falls off the tail.
#[derive(Debug, Clone)]
pub struct BoundedLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl BoundedLog {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn head(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    pub fn to_sequence(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a BoundedLog {
    type Item = &'a LogEntry;
    type IntoIter = vec_deque::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "tests/bounded_log_tests.rs"]
mod tests;
