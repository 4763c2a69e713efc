//! Bounded audit trail of access attempts and its upload queue.

use std::collections::VecDeque;

use crate::types::AccessLogEntry;

/// Most-recent-first list of access attempts with a fixed capacity.
///
/// Inserting past capacity drops the oldest entry.
#[derive(Debug, Clone)]
pub struct AccessLog {
    entries: VecDeque<AccessLogEntry>,
    capacity: usize,
}

impl AccessLog {
    /// Creates an empty log holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Restores a persisted log, newest first, trimming it to capacity.
    #[must_use]
    pub fn from_entries(entries: Vec<AccessLogEntry>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        log.entries = entries.into();
        log.entries.truncate(log.capacity);
        log
    }

    /// Inserts `entry` as the most recent one.
    pub fn push(&mut self, entry: AccessLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// The `limit` most recent entries, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<AccessLogEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }

    /// All entries, newest first, in their persisted shape.
    #[must_use]
    pub fn to_vec(&self) -> Vec<AccessLogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Entries waiting to be mirrored to the server, oldest first.
///
/// The queue is bounded: when full, the oldest pending entry is dropped. Entries
/// that fail to upload are put back at the front so ordering is preserved.
#[derive(Debug, Clone)]
pub struct LogOutbox {
    pending: VecDeque<AccessLogEntry>,
    capacity: usize,
}

impl LogOutbox {
    /// Creates an empty outbox. A capacity of zero disables replication.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity,
        }
    }

    /// Queues an entry. Returns the entry that was dropped to make room, if any.
    pub fn enqueue(&mut self, entry: AccessLogEntry) -> Option<AccessLogEntry> {
        if self.capacity == 0 {
            return Some(entry);
        }
        let dropped = if self.pending.len() >= self.capacity {
            self.pending.pop_front()
        } else {
            None
        };
        self.pending.push_back(entry);
        dropped
    }

    /// Takes every queued entry, oldest first.
    pub fn drain(&mut self) -> Vec<AccessLogEntry> {
        self.pending.drain(..).collect()
    }

    /// Puts back entries that could not be uploaded, ahead of anything queued since.
    ///
    /// Entries beyond capacity are dropped from the old end.
    pub fn requeue(&mut self, entries: Vec<AccessLogEntry>) {
        for entry in entries.into_iter().rev() {
            self.pending.push_front(entry);
        }
        while self.pending.len() > self.capacity {
            self.pending.pop_front();
        }
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::AccessAttemptResult;

    fn entry(n: usize) -> AccessLogEntry {
        AccessLogEntry {
            id: format!("log-{n}"),
            credential_id: "cred-1".to_string(),
            building_id: "b-1".to_string(),
            attempt: AccessAttemptResult::granted(
                "main-1",
                "Main Entrance",
                Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
            ),
        }
    }

    fn ids(entries: &[AccessLogEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn test_log_drops_oldest_past_capacity() {
        const MAX: usize = 5;
        let mut log = AccessLog::new(MAX);
        for n in 0..=MAX {
            log.push(entry(n));
        }

        assert_eq!(log.len(), MAX);
        let all = log.to_vec();
        assert!(all.iter().all(|e| e.id != "log-0"));
        assert_eq!(all[0].id, "log-5");
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut log = AccessLog::new(10);
        for n in 0..4 {
            log.push(entry(n));
        }
        assert_eq!(ids(&log.recent(2)), vec!["log-3", "log-2"]);
        assert_eq!(log.recent(100).len(), 4);
    }

    #[test]
    fn test_restore_trims_to_capacity() {
        let log = AccessLog::from_entries((0..8).map(entry).collect(), 3);
        assert_eq!(ids(&log.to_vec()), vec!["log-0", "log-1", "log-2"]);
    }

    #[test]
    fn test_outbox_is_bounded() {
        let mut outbox = LogOutbox::new(2);
        assert!(outbox.enqueue(entry(0)).is_none());
        assert!(outbox.enqueue(entry(1)).is_none());
        let dropped = outbox.enqueue(entry(2)).unwrap();
        assert_eq!(dropped.id, "log-0");
        assert_eq!(ids(&outbox.drain()), vec!["log-1", "log-2"]);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_requeue_keeps_order_ahead_of_new_entries() {
        let mut outbox = LogOutbox::new(10);
        outbox.enqueue(entry(0));
        outbox.enqueue(entry(1));
        let taken = outbox.drain();
        outbox.enqueue(entry(2));
        outbox.requeue(taken);
        assert_eq!(ids(&outbox.drain()), vec!["log-0", "log-1", "log-2"]);
    }

    #[test]
    fn test_zero_capacity_outbox_drops_everything() {
        let mut outbox = LogOutbox::new(0);
        assert!(outbox.enqueue(entry(0)).is_some());
        assert_eq!(outbox.len(), 0);
    }
}
