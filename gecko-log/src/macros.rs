//! Logging macros (no_std compatible)
//!
//! Every macro takes the logger first and an optional `target: "..."`;
//! without a target the calling module path is used.

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, target: $target:expr, $($arg:tt)*) => {{
        // the message is only formatted when the level is enabled
        if $logger.is_enabled($level) {
            let message = $crate::__private::format!($($arg)*);
            $logger.log($level, $target, message);
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)*) => {
        $crate::log!($logger, $level, target: module_path!(), $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Level, LogRingBuffer, Logger};

    #[test]
    fn test_debug_macro() {
        let ring = LogRingBuffer::new(100);
        let logger = Logger::new(Level::Debug).with_sink(ring.clone());

        debug!(logger, "test debug");
        debug!(logger, "value = {}", 42);

        let records = ring.dump_records();
        assert_eq!(records.len(), 2);
        assert!(records[1].message.contains("42"));
        assert_eq!(records[0].target, module_path!());
    }

    #[test]
    fn test_explicit_target() {
        let ring = LogRingBuffer::new(100);
        let logger = Logger::new(Level::Trace).with_sink(ring.clone());

        trace!(logger, target: "gecko::bus", "frame {:03x}", 0x1a2);

        let records = ring.dump_records();
        assert_eq!(records[0].target, "gecko::bus");
        assert_eq!(records[0].message, "frame 1a2");
    }

    #[test]
    fn test_level_filtering_in_macros() {
        let ring = LogRingBuffer::new(100);
        let logger = Logger::new(Level::Warn).with_sink(ring.clone());

        trace!(logger, "trace msg");
        debug!(logger, "debug msg");
        info!(logger, "info msg");
        warn!(logger, "warn msg");
        error!(logger, "error msg");

        let records = ring.dump_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[1].level, Level::Error);
    }
}
