use {
    crate::transaction::Transaction,
    std::{
        collections::{HashSet, VecDeque},
        sync::Arc,
    },
};

/// Bounded, insertion-ordered history of accepted transactions.
///
/// Newest entries sit at the back. No two entries share a hash; once an
/// entry is evicted its hash may be accepted again.
#[derive(Debug, Clone)]
pub struct TimelineBuffer {
    entries: VecDeque<Transaction>,
    hashes: HashSet<String>,
    capacity: usize,
}

impl TimelineBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            hashes: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `tx`, evicting the oldest entry if the bound is exceeded.
    ///
    /// Returns the evicted transaction, if any. Callers are expected to
    /// check [`contains`](Self::contains) first; a duplicate hash is ignored.
    pub fn append(&mut self, tx: Transaction) -> Option<Transaction> {
        if !self.hashes.insert(tx.hash.clone()) {
            return None;
        }
        self.entries.push_back(tx);

        if self.entries.len() > self.capacity {
            let evicted = self.entries.pop_front()?;
            self.hashes.remove(&evicted.hash);
            return Some(evicted);
        }
        None
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Frozen copy of the current entries, oldest first
    pub fn snapshot(&self) -> Arc<[Transaction]> {
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

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::transaction::Subtype,
        chrono::{TimeZone, Utc},
    };

    fn tx(hash: &str) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            account: "nano_1test".to_string(),
            amount: Some("1".to_string()),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            subtype: Subtype::Send,
        }
    }

    fn hashes(buffer: &TimelineBuffer) -> Vec<String> {
        buffer.snapshot().iter().map(|t| t.hash.clone()).collect()
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let mut buffer = TimelineBuffer::new(2);
        assert!(buffer.append(tx("A")).is_none());
        assert!(buffer.append(tx("B")).is_none());
        let evicted = buffer.append(tx("C"));

        assert_eq!(evicted.map(|t| t.hash), Some("A".to_string()));
        assert_eq!(hashes(&buffer), vec!["B", "C"]);
        assert!(!buffer.contains("A"));
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut buffer = TimelineBuffer::new(5);
        for i in 0..50 {
            buffer.append(tx(&format!("H{}", i % 13)));
            assert!(buffer.len() <= buffer.capacity());
        }
    }

    #[test]
    fn test_duplicate_hash_is_ignored() {
        let mut buffer = TimelineBuffer::new(3);
        buffer.append(tx("A"));
        buffer.append(tx("A"));
        assert_eq!(hashes(&buffer), vec!["A"]);
    }

    #[test]
    fn test_evicted_hash_may_return() {
        let mut buffer = TimelineBuffer::new(1);
        buffer.append(tx("A"));
        buffer.append(tx("B"));
        buffer.append(tx("A"));
        assert_eq!(hashes(&buffer), vec!["A"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut buffer = TimelineBuffer::new(3);
        buffer.append(tx("A"));
        let frozen = buffer.snapshot();
        buffer.append(tx("B"));

        assert_eq!(frozen.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let buffer = TimelineBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
    }
}
