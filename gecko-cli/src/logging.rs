//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。运行时的 `gecko-log`
//! 记录通过 [`TracingSink`] 转发为 `tracing` 事件。

use crate::config::LogConfig;
use gecko_config::Phase;
use gecko_log::{Level, LogSink, Record};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::Targets,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 使用指定格式和日志配置初始化日志系统
///
/// With `file`, records are also appended to it without colors.
pub fn init(log_config: &LogConfig, format: LogFormat, file: Option<&Path>) -> Result<(), String> {
    let mut targets = Targets::new().with_default(log_config.global);
    for phase in Phase::ALL {
        targets = targets.with_target(phase.target(), log_config.level_for(phase));
    }

    let file_layer = match file {
        Some(path) => {
            let handle = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("cannot open log file '{}': {e}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(handle))
                    .with_filter(targets.clone()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(format_layer(format, io::stderr).with_filter(targets))
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Create formatter layer based on format
fn format_layer<S, W>(format: LogFormat, make_writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

// tracing callsites need their target and level as constants
macro_rules! emit {
    ($level:expr, $target:literal, $tick:expr, $($arg:tt)+) => {
        match $level {
            Level::Trace => tracing::trace!(target: $target, tick = ?$tick, $($arg)+),
            Level::Debug => tracing::debug!(target: $target, tick = ?$tick, $($arg)+),
            Level::Info => tracing::info!(target: $target, tick = ?$tick, $($arg)+),
            Level::Warn => tracing::warn!(target: $target, tick = ?$tick, $($arg)+),
            Level::Error => tracing::error!(target: $target, tick = ?$tick, $($arg)+),
        }
    };
}

/// Forwards runtime log records to `tracing`
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        let (level, tick, message) = (record.level, record.tick, &record.message);
        match record.target {
            "gecko::build" => emit!(level, "gecko::build", tick, "{}", message),
            "gecko::tick" => emit!(level, "gecko::tick", tick, "{}", message),
            "gecko::call" => emit!(level, "gecko::call", tick, "{}", message),
            "gecko::bus" => emit!(level, "gecko::bus", tick, "{}", message),
            other => emit!(level, "gecko", tick, "{} ({})", message, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn record(level: Level, target: &'static str, message: &str) -> Record {
        Record {
            timestamp_ms: 0,
            level,
            target,
            message: message.to_string(),
            tick: Some(7),
        }
    }

    fn capture(records: &[Record]) -> String {
        let buffer = Capture::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            for record in records {
                TracingSink.write(record);
            }
        });
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_phase_targets_are_kept() {
        let out = capture(&[
            record(Level::Info, Phase::Bus.target(), "can 1a2,01,02"),
            record(Level::Warn, Phase::Call.target(), "motor.spin() failed"),
        ]);
        assert!(out.contains("gecko::bus"), "{out}");
        assert!(out.contains("can 1a2,01,02"), "{out}");
        assert!(out.contains("WARN"), "{out}");
        assert!(out.contains("gecko::call"), "{out}");
        assert!(out.contains("tick=Some(7)"), "{out}");
    }

    #[test]
    fn test_other_targets_fall_back() {
        let out = capture(&[record(Level::Debug, "gecko_api::runtime", "hello")]);
        assert!(out.contains("hello (gecko_api::runtime)"), "{out}");
    }

    #[test]
    fn test_phase_target_names() {
        let names: Vec<_> = Phase::ALL.iter().map(|p| p.target()).collect();
        assert_eq!(names, ["gecko::build", "gecko::tick", "gecko::call", "gecko::bus"]);
    }
}
