//! Logger (no_std + alloc compatible)

use crate::record::{Level, Record};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use spin::Mutex;

const NO_TICK: u64 = u64::MAX;

/// Log output target
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record);
}

/// Logger configuration and state
///
/// Shared as `Arc<Logger>` and handed explicitly to whoever needs it.
///
/// Sinks are called after the sink list is unlocked, so a sink may log into
/// the same logger or add sinks to it. A cycle of loggers forwarding into each
/// other recurses without bound.
pub struct Logger {
    level: AtomicU8,
    sinks: Mutex<Vec<Arc<dyn LogSink>>>,
    /// Tick stamped on new records, `NO_TICK` outside of a tick
    tick: AtomicU64,
}

impl Logger {
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(level as u8),
            sinks: Mutex::new(Vec::new()),
            tick: AtomicU64::new(NO_TICK),
        })
    }

    /// Add a sink (builder style)
    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        self.sinks.lock().push(Arc::new(sink));
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Info)
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Tick currently stamped on records, if any
    pub fn current_tick(&self) -> Option<u64> {
        match self.tick.load(Ordering::Relaxed) {
            NO_TICK => None,
            tick => Some(tick),
        }
    }

    #[inline(never)]
    pub fn log(
        &self,
        level: Level,
        target: &'static str,
        message: impl Into<alloc::string::String>,
    ) {
        if !self.is_enabled(level) {
            return;
        }

        let mut record = Record::new(level, target, message);
        if let Some(tick) = self.current_tick() {
            record = record.with_tick(tick);
        }

        let sinks = self.sinks.lock().clone();
        for sink in &sinks {
            sink.write(&record);
        }
    }

    /// Stamp every record with `tick` until the guard is dropped.
    ///
    /// Guards nest: dropping one restores the tick that was active before it.
    pub fn enter_tick(self: &Arc<Self>, tick: u64) -> TickGuard {
        let previous = self.tick.swap(tick, Ordering::Relaxed);
        TickGuard {
            logger: Arc::clone(self),
            previous,
        }
    }

    /// Logger with no sinks (tests, disabled logging)
    pub fn noop() -> Arc<Self> {
        Self::new(Level::Error)
    }
}

/// Restores the previous tick stamp on drop
pub struct TickGuard {
    logger: Arc<Logger>,
    previous: u64,
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.logger.tick.store(self.previous, Ordering::Relaxed);
    }
}

// Forwarding into another logger lets one logger fan out into a second one.
impl LogSink for Arc<Logger> {
    fn write(&self, record: &Record) {
        self.log(record.level, record.target, record.message.clone());
    }
}

#[cfg(feature = "std")]
pub struct StdoutSink;

#[cfg(feature = "std")]
impl LogSink for StdoutSink {
    fn write(&self, record: &Record) {
        println!("{}", record.format());
    }
}

#[cfg(feature = "std")]
pub struct StderrSink;

#[cfg(feature = "std")]
impl LogSink for StderrSink {
    fn write(&self, record: &Record) {
        eprintln!("{}", record.format());
    }
}

/// Appends formatted records to a file
#[cfg(feature = "std")]
pub struct FileSink {
    file: std::sync::Mutex<std::fs::File>,
}

#[cfg(feature = "std")]
impl FileSink {
    pub fn new(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(FileSink {
            file: std::sync::Mutex::new(file),
        })
    }
}

#[cfg(feature = "std")]
impl LogSink for FileSink {
    #[inline(never)]
    fn write(&self, record: &Record) {
        use std::io::Write;
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", record.format());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogRingBuffer;

    #[test]
    fn test_logger_creation() {
        let logger = Logger::new(Level::Debug);
        assert_eq!(logger.level(), Level::Debug);
        assert!(logger.is_enabled(Level::Debug));
        assert!(!logger.is_enabled(Level::Trace));
    }

    #[test]
    fn test_level_change() {
        let logger = Logger::new(Level::Info);
        assert!(!logger.is_enabled(Level::Debug));

        logger.set_level(Level::Debug);
        assert!(logger.is_enabled(Level::Debug));
    }

    #[test]
    fn test_log_disabled_level() {
        let ring = LogRingBuffer::new(100);
        let logger = Logger::new(Level::Warn).with_sink(ring.clone());

        logger.log(Level::Debug, "test", "should not appear");
        assert_eq!(ring.len(), 0);

        logger.log(Level::Warn, "test", "should appear");
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_tick_guard_stamps_records() {
        let ring = LogRingBuffer::new(100);
        let logger = Logger::new(Level::Debug).with_sink(ring.clone());

        logger.log(Level::Info, "test", "before");
        {
            let guard = logger.enter_tick(7);
            assert_eq!(logger.current_tick(), Some(7));
            logger.log(Level::Info, "test", "during");
            drop(guard);
        }
        logger.log(Level::Info, "test", "after");

        let records = ring.dump_records();
        assert_eq!(records[0].tick, None);
        assert_eq!(records[1].tick, Some(7));
        assert_eq!(records[2].tick, None);
    }

    #[test]
    fn test_nested_tick_guards_restore() {
        let logger = Logger::new(Level::Debug);
        let outer = logger.enter_tick(1);
        {
            let inner = logger.enter_tick(2);
            assert_eq!(logger.current_tick(), Some(2));
            drop(inner);
        }
        assert_eq!(logger.current_tick(), Some(1));
        drop(outer);
        assert_eq!(logger.current_tick(), None);
    }

    #[test]
    fn test_log_sink_for_arc_logger() {
        let ring = LogRingBuffer::new(100);
        let inner = Logger::new(Level::Debug).with_sink(ring.clone());

        let outer = Logger::new(Level::Debug);
        outer.add_sink(inner.clone());
        outer.log(Level::Info, "chain", "chained log");

        let records = ring.dump_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, "chain");
    }

    /// Answers every `ping` by logging a `pong` into the same logger
    struct Echo(alloc::sync::Weak<Logger>);

    impl LogSink for Echo {
        fn write(&self, record: &Record) {
            if record.target != "ping" {
                return;
            }
            if let Some(logger) = self.0.upgrade() {
                logger.log(Level::Info, "pong", record.message.clone());
                logger.add_sink(LogRingBuffer::new(1));
            }
        }
    }

    #[test]
    fn test_sink_can_reenter_its_logger() {
        let ring = LogRingBuffer::new(100);
        let logger = Logger::new(Level::Debug);
        logger.add_sink(Echo(Arc::downgrade(&logger)));
        logger.add_sink(ring.clone());

        logger.log(Level::Info, "ping", "hello");

        let targets: Vec<_> = ring.dump_records().iter().map(|r| r.target).collect();
        assert_eq!(targets, ["pong", "ping"]);
        assert_eq!(logger.sinks.lock().len(), 3);
    }

    #[test]
    fn test_logger_forwarding_into_itself_below_its_level() {
        let ring = LogRingBuffer::new(100);
        let logger = Logger::new(Level::Info).with_sink(ring.clone());
        let quiet = Logger::new(Level::Error);
        quiet.add_sink(logger.clone());
        logger.add_sink(quiet.clone());

        // the cycle stops at `quiet`, which drops info records
        logger.log(Level::Info, "loop", "once");
        assert_eq!(ring.len(), 1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_file_sink_append() {
        let path = std::env::temp_dir().join(format!("gecko_log_{}.tmp", std::process::id()));

        for line in ["first line", "second line"] {
            let sink = FileSink::new(&path).unwrap();
            sink.write(&Record::new(Level::Error, "test", line));
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("first line"));
        assert!(content.contains("second line"));
        assert!(content.contains("ERROR"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_noop_logger() {
        let logger = Logger::noop();
        assert!(!logger.is_enabled(Level::Warn));
        logger.log(Level::Error, "test", "goes nowhere");
    }
}
