use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const HISTORY_CAPACITY: usize = 5;

/// Characters of a title shown in the history list before it is cut.
pub const HISTORY_TITLE_WIDTH: usize = 30;

/// A completed job kept for quick re-access to its artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub filename: String,
    #[serde(default)]
    pub subtitle_filename: Option<String>,
}

/// Most-recent-first record of completed jobs, at most [`HISTORY_CAPACITY`] long.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryCache {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cache from persisted entries, already most-recent-first.
    /// Anything past capacity is dropped.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(HISTORY_CAPACITY);
        Self { entries }
    }

    /// Inserts at the front and evicts the oldest entry once over capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn list(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shortens a title for the history list. The stored entry is never changed.
pub fn display_title(title: &str) -> String {
    if title.chars().count() <= HISTORY_TITLE_WIDTH {
        return title.to_string();
    }
    let mut short: String = title.chars().take(HISTORY_TITLE_WIDTH).collect();
    short.push_str("...");
    short
}
