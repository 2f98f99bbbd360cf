//! gecko-log - structured logging for the control loop
//!
//! Designed for firmware as much as for the host simulator:
//! - **No platform coupling**: `no_std` + `alloc` works, platforms are picked by feature flag
//! - **Explicit passing**: there is no global logger, an `Arc<Logger>` travels with the config
//! - **Tick stamping**: records written while a tick guard is alive carry the tick number
//! - **Post-mortem**: a ring buffer keeps the last N records for dumping after a fault
//!
//! # Quick start
//!
//! ```ignore
//! use gecko_log::{LogConfig, debug};
//!
//! let (logger, ring) = LogConfig::dev().init();
//! let guard = logger.enter_tick(42);
//! debug!(logger, "duty = {}", 128);
//! drop(guard);
//! ```
//!
//! ## no_std + alloc
//!
//! ```ignore
//! use gecko_log::{Logger, Level, LogRingBuffer, warn};
//!
//! let ring = LogRingBuffer::new(256);
//! let logger = Logger::new(Level::Warn).with_sink(ring);
//! warn!(logger, target: "gecko::bus", "rx queue overflow");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod macros;
mod record;

#[cfg(feature = "alloc")]
mod ring_buffer;

#[cfg(feature = "alloc")]
mod logger;

#[cfg(feature = "std")]
mod config;

pub use record::{Level, Record};

// trace!, debug!, info!, warn!, error!, log! are exported at the crate root

#[cfg(feature = "alloc")]
pub use ring_buffer::{LogRingBuffer, RingBufferStats};

#[cfg(feature = "alloc")]
pub use logger::{LogSink, Logger, TickGuard};

#[cfg(feature = "std")]
pub use logger::{FileSink, StderrSink, StdoutSink};

#[cfg(feature = "std")]
pub use config::{LogConfig, OutputConfig};

#[doc(hidden)]
#[cfg(feature = "alloc")]
pub mod __private {
    pub use alloc::format;
}

/// Logging result type
pub type Result<T> = core::result::Result<T, Error>;

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (std only)
    #[cfg(feature = "std")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Unknown level name
    #[error("Unknown log level")]
    UnknownLevel,
}
