//! CLI 配置
//!
//! 日志级别：全局级别加上按阶段（build / tick / call / bus）的覆盖。

use gecko_config::Phase;
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub build: Option<Level>,
    pub tick: Option<Level>,
    pub call: Option<Level>,
    pub bus: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            build: None,
            tick: None,
            call: None,
            bus: None,
        }
    }
}

impl LogConfig {
    pub fn new(global: Level) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    pub fn set_phase(&mut self, phase: Phase, level: Level) {
        let slot = match phase {
            Phase::Build => &mut self.build,
            Phase::Tick => &mut self.tick,
            Phase::Call => &mut self.call,
            Phase::Bus => &mut self.bus,
        };
        *slot = Some(level);
    }

    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        let level = match phase {
            Phase::Build => self.build,
            Phase::Tick => self.tick,
            Phase::Call => self.call,
            Phase::Bus => self.bus,
        };
        level.unwrap_or(self.global)
    }

    /// Most verbose level any target accepts; the runtime logger filters at
    /// this level before records reach `tracing`
    pub fn runtime_level(&self) -> gecko_log::Level {
        Phase::ALL
            .iter()
            .map(|phase| to_runtime_level(self.level_for(*phase)))
            .chain(std::iter::once(to_runtime_level(self.global)))
            .min()
            .unwrap_or(gecko_log::Level::Info)
    }
}

pub fn to_runtime_level(level: Level) -> gecko_log::Level {
    match level {
        Level::TRACE => gecko_log::Level::Trace,
        Level::DEBUG => gecko_log::Level::Debug,
        Level::INFO => gecko_log::Level::Info,
        Level::WARN => gecko_log::Level::Warn,
        _ => gecko_log::Level::Error,
    }
}

/// Parse log level string
pub fn parse_log_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "silent" => Some(Level::ERROR), // silent = only errors
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// `bus=trace` style override
pub fn parse_phase_level(s: &str) -> Result<(Phase, Level), String> {
    let (phase, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PHASE=LEVEL, got '{s}'"))?;
    let phase = Phase::ALL
        .into_iter()
        .find(|p| p.as_str() == phase)
        .ok_or_else(|| format!("unknown phase '{phase}' (build, tick, call, bus)"))?;
    let level = parse_log_level(level).ok_or_else(|| format!("unknown log level '{level}'"))?;
    Ok((phase, level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_falls_back_to_global() {
        let mut config = LogConfig::new(Level::WARN);
        config.set_phase(Phase::Bus, Level::TRACE);
        assert_eq!(config.level_for(Phase::Bus), Level::TRACE);
        assert_eq!(config.level_for(Phase::Tick), Level::WARN);
    }

    #[test]
    fn test_runtime_level_is_most_verbose() {
        let mut config = LogConfig::new(Level::WARN);
        assert_eq!(config.runtime_level(), gecko_log::Level::Warn);
        config.set_phase(Phase::Call, Level::DEBUG);
        assert_eq!(config.runtime_level(), gecko_log::Level::Debug);
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_log_level("silent"), Some(Level::ERROR));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_parse_phase_level() {
        assert_eq!(parse_phase_level("bus=trace"), Ok((Phase::Bus, Level::TRACE)));
        assert!(parse_phase_level("bus").is_err());
        assert!(parse_phase_level("vm=info").unwrap_err().contains("unknown phase"));
        assert!(parse_phase_level("tick=loud").is_err());
    }
}
