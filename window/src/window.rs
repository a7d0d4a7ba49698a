use std::cmp::Ordering;

use crate::record::LogRecord;
use crate::record::RecordKey;

/// Loaded slice of one stream, ascending by key with no duplicate keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Window {
    records: Vec<LogRecord>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest loaded record.
    pub fn top(&self) -> Option<&LogRecord> {
        self.records.first()
    }

    /// Newest loaded record.
    pub fn bottom(&self) -> Option<&LogRecord> {
        self.records.last()
    }

    pub fn position_of(&self, key: RecordKey) -> Option<usize> {
        self.records
            .binary_search_by(|probe| probe.key().cmp(&key))
            .ok()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Merge `incoming` and return how many new keys were added.
    ///
    /// Existing records win over incoming copies with the same key. The result
    /// does not depend on the order batches arrive in.
    pub fn merge(&mut self, mut incoming: Vec<LogRecord>) -> usize {
        if incoming.is_empty() {
            return 0;
        }
        incoming.sort_by_key(LogRecord::key);
        incoming.dedup_by_key(|record| record.key());

        let before = self.records.len();
        let existing = std::mem::take(&mut self.records);
        let mut merged = Vec::with_capacity(existing.len() + incoming.len());
        let mut existing = existing.into_iter().peekable();
        let mut incoming = incoming.into_iter().peekable();
        loop {
            let order = match (existing.peek(), incoming.peek()) {
                (Some(old), Some(new)) => old.cmp_key(new),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };
            match order {
                Ordering::Less => merged.extend(existing.next()),
                Ordering::Greater => merged.extend(incoming.next()),
                Ordering::Equal => {
                    merged.extend(existing.next());
                    incoming.next();
                }
            }
        }
        self.records = merged;
        self.records.len() - before
    }
}
