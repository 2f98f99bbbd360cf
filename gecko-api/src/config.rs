//! API 层配置
//!
//! `RunConfig` is built by the host and handed to the runtime explicitly.

use gecko_config::{BusConfig, TickConfig};
use gecko_log::Logger;
use std::sync::Arc;

/// Execution configuration
#[derive(Clone)]
pub struct RunConfig {
    /// Tick period and tick limit
    pub tick: TickConfig,
    /// Queue sizes for bus modules
    pub bus: BusConfig,
    /// Stop the run at the first tick that reports an error
    pub stop_on_error: bool,
    pub logger: Arc<Logger>,
}

impl RunConfig {
    pub fn with_logger(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("tick", &self.tick)
            .field("bus", &self.bus)
            .field("stop_on_error", &self.stop_on_error)
            .field("log_level", &self.logger.level())
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            bus: BusConfig::default(),
            stop_on_error: false,
            logger: Logger::noop(),
        }
    }
}
