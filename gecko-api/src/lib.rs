//! Gecko API - hardware modules and the host runtime
//!
//! Provides:
//! - Driver traits and simulated drivers ([`hardware`])
//! - The `PwmOutput` and `Can` modules ([`modules`])
//! - The tick loop ([`Runtime`])
//! - Project files ([`Project`]) and a one-call [`run`]
//! - Unified error handling ([`GeckoError`])
//!
//! Configuration is passed explicitly through [`RunConfig`]; there is no
//! global state.

pub mod config;
pub mod error;
pub mod hardware;
pub mod modules;
pub mod project;
pub mod runtime;

pub use config::RunConfig;
pub use error::{ErrorReport, GeckoError};
pub use hardware::{BusTransceiver, HardwareError, PwmDriver, SimBus, SimPwm};
pub use modules::{Can, PwmOutput};
pub use project::{run, Project, Session};
pub use runtime::{RunSummary, Runtime, TickError, TickReport};

// Re-export the layers below
pub use gecko_config;
pub use gecko_config::{BusConfig, Phase, TickConfig};
pub use gecko_core;
pub use gecko_core::{Expression, Module, ModuleId, Value};
pub use gecko_log;
