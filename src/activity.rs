use crate::model::{ActivityType, LogEntry, Ms, new_log_id};

/// Append-only activity log.
///
/// New entries go to the head, but insertion order is not a contract: a
/// snapshot replace can hand us entries in any order. Readers go through
/// [`ActivityLog::sorted`], which orders by timestamp, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, timestamp: Ms, user_id: &str, activity_type: ActivityType, details: String) -> &LogEntry {
        self.entries.insert(
            0,
            LogEntry {
                id: new_log_id(),
                timestamp,
                user_id: user_id.to_string(),
                activity_type,
                details,
            },
        );
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw storage order, for serialization only.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Canonical read order: timestamp descending, ties keep storage order.
    pub fn sorted(&self) -> Vec<&LogEntry> {
        let mut out: Vec<&LogEntry> = self.entries.iter().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    pub fn recent(&self, n: usize) -> Vec<&LogEntry> {
        let mut out = self.sorted();
        out.truncate(n);
        out
    }
}
