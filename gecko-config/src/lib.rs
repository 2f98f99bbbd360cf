//! Gecko Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Gecko crates.

use serde::{Deserialize, Serialize};

/// Timing of the host control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Period between two ticks in milliseconds (0 = run ticks back to back)
    pub interval_ms: u64,
    /// Stop after this many ticks; `None` runs until the host stops it
    pub max_ticks: Option<u64>,
}

/// Queue sizes of a bus peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Inbound frames buffered between two ticks
    pub rx_queue_len: usize,
    /// Outbound frames buffered before `send` starts failing
    pub tx_queue_len: usize,
}

/// Execution phase enum for phase-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Building modules, variables and expression trees
    Build,
    /// Evaluating bindings and stepping modules
    Tick,
    /// Out-of-band method calls
    Call,
    /// Bus message routing
    Bus,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Build, Phase::Tick, Phase::Call, Phase::Bus];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Build => "build",
            Phase::Tick => "tick",
            Phase::Call => "call",
            Phase::Bus => "bus",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> &'static str {
        match self {
            Phase::Build => "gecko::build",
            Phase::Tick => "gecko::tick",
            Phase::Call => "gecko::call",
            Phase::Bus => "gecko::bus",
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10,
            max_ticks: None,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            rx_queue_len: 20,
            tx_queue_len: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tick_config() {
        let cfg = TickConfig::default();
        assert_eq!(cfg.interval_ms, 10);
        assert_eq!(cfg.max_ticks, None);
    }

    #[test]
    fn test_default_bus_config() {
        let cfg = BusConfig::default();
        assert_eq!(cfg.rx_queue_len, 20);
        assert_eq!(cfg.tx_queue_len, 20);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Build.as_str(), "build");
        assert_eq!(Phase::Tick.target(), "gecko::tick");
        assert!(Phase::ALL.iter().all(|p| p.target().ends_with(p.as_str())));
    }

    #[test]
    fn test_partial_tick_config_uses_defaults() {
        let cfg: TickConfig = serde_json::from_str(r#"{ "max_ticks": 5 }"#).unwrap();
        assert_eq!(cfg.interval_ms, 10);
        assert_eq!(cfg.max_ticks, Some(5));
    }
}
