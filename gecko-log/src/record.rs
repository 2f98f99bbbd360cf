//! Log records (no_std compatible)

use core::fmt;
use core::str::FromStr;

/// Log level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warn),
            4 => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = crate::Error;

    /// Case-insensitive; `silent` maps to `Error` (only faults get through)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const NAMES: [(&str, Level); 6] = [
            ("trace", Level::Trace),
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warn", Level::Warn),
            ("error", Level::Error),
            ("silent", Level::Error),
        ];
        NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, level)| *level)
            .ok_or(crate::Error::UnknownLevel)
    }
}

/// A single log record
#[cfg(feature = "alloc")]
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Milliseconds since the epoch (std) or a monotonic counter (no_std)
    pub timestamp_ms: u64,
    pub level: Level,
    /// Module path or phase target (`gecko::tick`, ...)
    pub target: &'static str,
    pub message: alloc::string::String,
    /// Control tick during which the record was written
    pub tick: Option<u64>,
}

#[cfg(feature = "alloc")]
impl Record {
    pub fn new(
        level: Level,
        target: &'static str,
        message: impl Into<alloc::string::String>,
    ) -> Self {
        Self {
            timestamp_ms: current_timestamp_ms(),
            level,
            target,
            message: message.into(),
            tick: None,
        }
    }

    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Single-line rendering used by every text sink
    pub fn format(&self) -> alloc::string::String {
        let tick_info = match self.tick {
            Some(tick) => alloc::format!(" [tick={tick}]"),
            None => alloc::string::String::new(),
        };

        alloc::format!(
            "[{}] {} {}{}: {}",
            format_timestamp(self.timestamp_ms),
            self.level,
            self.target,
            tick_info,
            self.message
        )
    }
}

#[cfg(feature = "std")]
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// Firmware builds without a wall clock get a monotonic sequence number instead.
#[cfg(all(feature = "alloc", not(feature = "std")))]
fn current_timestamp_ms() -> u64 {
    use core::sync::atomic::{AtomicU64, Ordering};
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

#[cfg(feature = "alloc")]
fn format_timestamp(timestamp_ms: u64) -> alloc::string::String {
    let secs = timestamp_ms / 1000;
    let millis = timestamp_ms % 1000;

    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;

    alloc::format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_u8() {
        assert_eq!(Level::from_u8(0), Some(Level::Trace));
        assert_eq!(Level::from_u8(4), Some(Level::Error));
        assert_eq!(Level::from_u8(5), None);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("silent".parse::<Level>().unwrap(), Level::Error);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_record_with_tick() {
        let record = Record::new(Level::Debug, "gecko::tick", "msg").with_tick(42);
        assert_eq!(record.tick, Some(42));
        assert_eq!(record.target, "gecko::tick");
    }

    #[test]
    fn test_record_format() {
        let record = Record {
            timestamp_ms: 3_600_000 + 120_000 + 3_000 + 456,
            level: Level::Info,
            target: "gecko::bus",
            message: alloc::string::String::from("can 100,01,02"),
            tick: Some(7),
        };

        let formatted = record.format();
        assert!(formatted.starts_with("[01:02:03.456]"));
        assert!(formatted.contains("INFO gecko::bus [tick=7]: can 100,01,02"));
    }

    #[test]
    fn test_record_format_without_tick() {
        let record = Record::new(Level::Warn, "gecko::build", "no tick");
        assert!(!record.format().contains("tick="));
    }
}
