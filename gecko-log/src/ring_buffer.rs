//! Bounded record buffer for post-mortem dumps (no_std + alloc compatible)

use crate::logger::LogSink;
use crate::record::Record;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use spin::Mutex;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RingBufferStats {
    pub record_count: usize,
    /// Records evicted because the buffer was full
    pub dropped_count: usize,
    pub capacity: usize,
}

/// Keeps the newest `capacity` records; older ones are overwritten (FIFO)
pub struct LogRingBuffer {
    inner: Mutex<VecDeque<Record>>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(LogRingBuffer {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicUsize::new(0),
        })
    }

    fn push(&self, record: Record) {
        if self.capacity == 0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let mut inner = self.inner.lock();
        if inner.len() >= self.capacity {
            inner.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        inner.push_back(record);
    }

    /// All buffered records, oldest first
    pub fn dump_records(&self) -> Vec<Record> {
        self.inner.lock().iter().cloned().collect()
    }

    /// Buffered records rendered one per line
    pub fn dump(&self) -> String {
        self.inner
            .lock()
            .iter()
            .map(Record::format)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RingBufferStats {
        RingBufferStats {
            record_count: self.len(),
            dropped_count: self.dropped_count(),
            capacity: self.capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for LogRingBuffer {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

impl LogSink for Arc<LogRingBuffer> {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    #[test]
    fn test_overflow_keeps_newest() {
        let buffer = LogRingBuffer::new(3);

        for i in 0..5 {
            buffer.push(Record::new(Level::Info, "test", alloc::format!("msg{i}")));
        }

        let records = buffer.dump_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].message, "msg2");
        assert_eq!(records[2].message, "msg4");
        assert_eq!(buffer.dropped_count(), 2);
    }

    #[test]
    fn test_zero_capacity_drops_everything() {
        let buffer = LogRingBuffer::new(0);
        buffer.push(Record::new(Level::Info, "test", "lost"));
        assert!(buffer.is_empty());
        assert_eq!(buffer.dropped_count(), 1);
    }

    #[test]
    fn test_clear() {
        let buffer = LogRingBuffer::new(1);
        buffer.push(Record::new(Level::Info, "test", "msg1"));
        buffer.push(Record::new(Level::Info, "test", "msg2"));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.dropped_count(), 0);
    }

    #[test]
    fn test_dump_format() {
        let buffer = LogRingBuffer::new(10);

        buffer.push(Record::new(Level::Info, "test", "first line"));
        buffer.push(Record::new(Level::Warn, "test", "second line").with_tick(3));

        let dump = buffer.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO") && lines[0].contains("first line"));
        assert!(lines[1].contains("[tick=3]"));
    }

    #[test]
    fn test_stats() {
        let buffer = LogRingBuffer::new(5);
        assert_eq!(
            buffer.stats(),
            RingBufferStats {
                record_count: 0,
                dropped_count: 0,
                capacity: 5
            }
        );

        for i in 0..8 {
            LogSink::write(&buffer, &Record::new(Level::Info, "test", alloc::format!("msg{i}")));
        }

        let stats = buffer.stats();
        assert_eq!(stats.record_count, 5);
        assert_eq!(stats.dropped_count, 3);
    }
}
