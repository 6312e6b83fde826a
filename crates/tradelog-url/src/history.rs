//! Browser-history abstraction.
//!
//! The engine never touches a real address bar; it writes through a
//! `HistorySink`, which a host binds to whatever owns the location.

use parking_lot::Mutex;

/// How a new location is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Overwrite the current entry. Used for filter/sort/page changes so
    /// paging through results does not fill the back-button history.
    Replace,
    /// Append a new entry. Reserved for deliberate navigation.
    Push,
}

impl HistoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Push => "push",
        }
    }
}

/// Destination for location updates.
pub trait HistorySink: Send + Sync {
    /// Record `query` (canonical, without leading `?`) using `mode`.
    fn write(&self, query: &str, mode: HistoryMode);

    /// Current query string, if any.
    fn current(&self) -> Option<String>;
}

/// A recorded history write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub query: String,
    pub mode: HistoryMode,
}

/// In-memory history stack.
///
/// Behaves like a browser session history: `Push` appends, `Replace`
/// overwrites the top entry. Every write is also logged for inspection.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    stack: Mutex<Vec<String>>,
    writes: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an initial location, as when a page is opened from a link.
    pub fn with_initial(query: impl Into<String>) -> Self {
        let history = Self::new();
        history.stack.lock().push(query.into());
        history
    }

    /// Number of entries in the back-button stack.
    pub fn depth(&self) -> usize {
        self.stack.lock().len()
    }

    /// All writes, in order.
    pub fn writes(&self) -> Vec<HistoryEntry> {
        self.writes.lock().clone()
    }
}

impl HistorySink for MemoryHistory {
    fn write(&self, query: &str, mode: HistoryMode) {
        let mut stack = self.stack.lock();
        match mode {
            HistoryMode::Push => stack.push(query.to_string()),
            HistoryMode::Replace => match stack.last_mut() {
                Some(top) => *top = query.to_string(),
                None => stack.push(query.to_string()),
            },
        }
        self.writes.lock().push(HistoryEntry {
            query: query.to_string(),
            mode,
        });
    }

    fn current(&self) -> Option<String> {
        self.stack.lock().last().cloned()
    }
}
