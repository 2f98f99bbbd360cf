//! Log configuration (std only)
//!
//! One-call initialisation of a logger and its sinks.

use crate::{Level, LogRingBuffer, Logger};
use alloc::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum OutputConfig {
    #[cfg(feature = "stdout")]
    Stdout,
    #[cfg(feature = "stderr")]
    Stderr,
    /// Append to a file (path)
    #[cfg(feature = "file")]
    File(String),
    /// Keep the last N records in memory
    RingBuffer(usize),
}

/// Logger configuration
///
/// ```
/// use gecko_log::{LogConfig, Level};
///
/// let (logger, ring) = LogConfig::new(Level::Debug)
///     .with_ring_buffer(1024)
///     .init();
/// assert!(ring.is_some());
/// ```
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: Level,
    pub outputs: Vec<OutputConfig>,
}

impl LogConfig {
    pub fn new(level: Level) -> Self {
        LogConfig {
            level,
            outputs: Vec::new(),
        }
    }

    /// Debug level, stdout plus a 10 000 record crash buffer
    #[cfg(feature = "stdout")]
    pub fn dev() -> Self {
        LogConfig {
            level: Level::Debug,
            outputs: vec![OutputConfig::Stdout, OutputConfig::RingBuffer(10_000)],
        }
    }

    /// Warn level, stderr plus a 1 000 record crash buffer
    #[cfg(feature = "stderr")]
    pub fn production() -> Self {
        LogConfig {
            level: Level::Warn,
            outputs: vec![OutputConfig::Stderr, OutputConfig::RingBuffer(1_000)],
        }
    }

    /// Silent
    pub fn test() -> Self {
        LogConfig::new(Level::Error)
    }

    #[cfg(feature = "stdout")]
    pub fn with_stdout(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stdout) {
            self.outputs.push(OutputConfig::Stdout);
        }
        self
    }

    #[cfg(feature = "stderr")]
    pub fn with_stderr(mut self) -> Self {
        if !self.outputs.contains(&OutputConfig::Stderr) {
            self.outputs.push(OutputConfig::Stderr);
        }
        self
    }

    #[cfg(feature = "file")]
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.outputs.push(OutputConfig::File(path.into()));
        self
    }

    pub fn with_ring_buffer(mut self, capacity: usize) -> Self {
        self.outputs.push(OutputConfig::RingBuffer(capacity));
        self
    }

    /// Build the logger.
    ///
    /// Returns the last configured ring buffer as well so the host can dump it
    /// after a fault. Unopenable files are skipped.
    pub fn init(self) -> (Arc<Logger>, Option<Arc<LogRingBuffer>>) {
        let logger = Logger::new(self.level);
        let mut ring_buffer = None;

        for output in self.outputs {
            match output {
                #[cfg(feature = "stdout")]
                OutputConfig::Stdout => logger.add_sink(crate::StdoutSink),
                #[cfg(feature = "stderr")]
                OutputConfig::Stderr => logger.add_sink(crate::StderrSink),
                #[cfg(feature = "file")]
                OutputConfig::File(path) => {
                    if let Ok(sink) = crate::FileSink::new(&path) {
                        logger.add_sink(sink);
                    }
                }
                OutputConfig::RingBuffer(capacity) => {
                    let ring = LogRingBuffer::new(capacity);
                    ring_buffer = Some(Arc::clone(&ring));
                    logger.add_sink(ring);
                }
            }
        }

        (logger, ring_buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_test_is_silent() {
        let config = LogConfig::test();
        assert_eq!(config.level, Level::Error);
        assert!(config.outputs.is_empty());
    }

    #[cfg(feature = "stdout")]
    #[test]
    fn test_with_stdout_deduplicates() {
        let config = LogConfig::new(Level::Info).with_stdout().with_stdout();
        let stdout_count = config
            .outputs
            .iter()
            .filter(|o| matches!(o, OutputConfig::Stdout))
            .count();
        assert_eq!(stdout_count, 1);
    }

    #[test]
    fn test_config_init() {
        let (logger, ring) = LogConfig::new(Level::Debug).with_ring_buffer(100).init();

        assert_eq!(logger.level(), Level::Debug);
        crate::debug!(logger, "test message");
        let records = ring.unwrap().dump_records();
        assert_eq!(records.len(), 1);
    }
}
