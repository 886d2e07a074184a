//! MemoryBuffer - bounded in-memory FIFO

use std::collections::VecDeque;

use contracts::{Record, RecordBuffer};
use tracing::warn;

/// In-memory pending-record buffer.
///
/// Bounded; when full, the oldest record is dropped to make room so the
/// newest data is always retained.
pub struct MemoryBuffer {
    name: String,
    capacity: usize,
    items: VecDeque<Record>,
}

impl MemoryBuffer {
    /// Create a buffer with the given capacity
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            items: VecDeque::with_capacity(capacity.min(1024)),
        }
    }
}

impl RecordBuffer for MemoryBuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn store_item(&mut self, record: Record) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
            warn!(
                buffer = %self.name,
                capacity = self.capacity,
                "buffer full, oldest record dropped"
            );
        }
        self.items.push_back(record);
    }

    fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn retrieve_items(&self, max_count: usize) -> Vec<Record> {
        self.items.iter().take(max_count).cloned().collect()
    }

    fn discard_oldest(&mut self, count: usize) {
        let count = count.min(self.items.len());
        self.items.drain(..count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: u64) -> Record {
        Record::new(timestamp, 10, vec![timestamp as f64])
    }

    #[test]
    fn test_fifo_order_across_retrieve_and_discard() {
        let mut buffer = MemoryBuffer::new("test", 100);
        for t in 0..5 {
            buffer.store_item(record(t));
        }

        let first = buffer.retrieve_items(2);
        assert_eq!(first[0].timestamp, 0);
        assert_eq!(first[1].timestamp, 1);

        buffer.discard_oldest(2);
        let rest = buffer.retrieve_items(10);
        assert_eq!(
            rest.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn test_retrieve_is_non_destructive() {
        let mut buffer = MemoryBuffer::new("test", 100);
        buffer.store_item(record(1));
        buffer.store_item(record(2));

        assert_eq!(buffer.retrieve_items(10).len(), 2);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.retrieve_items(10).len(), 2);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut buffer = MemoryBuffer::new("test", 3);
        for t in 0..5 {
            buffer.store_item(record(t));
        }

        assert_eq!(buffer.len(), 3);
        let items = buffer.retrieve_items(10);
        assert_eq!(
            items.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn test_discard_clamps_to_length() {
        let mut buffer = MemoryBuffer::new("test", 100);
        buffer.store_item(record(1));
        buffer.discard_oldest(10);
        assert!(!buffer.has_items());
    }
}
