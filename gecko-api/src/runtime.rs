//! Host tick loop
//!
//! One tick visits every module in registration order:
//!
//! 1. evaluate the module's bindings against the current state,
//! 2. write the results into its properties,
//! 3. call its `step()`,
//! 4. deliver the bus messages it forwarded to their subscribers.
//!
//! Bindings that target script variables run once at the start of the tick.
//! Errors are collected in the [`TickReport`]; a failing module never stops
//! the ones after it.

use crate::config::RunConfig;
use crate::error::GeckoError;
use gecko_config::Phase;
use gecko_core::{
    Binding, BusMessage, EvalContext, Expression, Module, ModuleId, ModuleSet, StepContext,
    Value, VariableId, VariableStore,
};
use gecko_log::{debug, info, trace, warn, Logger};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An error raised during a tick, scoped to where it happened
#[derive(Debug, Clone, PartialEq)]
pub struct TickError {
    pub tick: u64,
    /// Module that raised it; `None` for variable bindings
    pub module: Option<ModuleId>,
    /// Binding label, `module.step()` or `module.method()`
    pub origin: String,
    pub error: GeckoError,
}

impl std::fmt::Display for TickError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tick {}: {}: {}", self.tick, self.origin, self.error)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    pub tick: u64,
    pub errors: Vec<TickError>,
    /// Bus messages handed to subscribers during this tick
    pub delivered: usize,
}

impl TickReport {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, module: Option<ModuleId>, origin: String, error: GeckoError) {
        self.errors.push(TickError {
            tick: self.tick,
            module,
            origin,
            error,
        });
    }
}

/// Owns the module graph, the script variables and their bindings
pub struct Runtime {
    config: RunConfig,
    variables: VariableStore,
    modules: ModuleSet,
    order: Vec<ModuleId>,
    variable_bindings: Vec<Binding>,
    /// Property bindings, indexed by module
    module_bindings: Vec<Vec<Binding>>,
    scratch: Vec<Option<Value>>,
    outbox: Vec<(ModuleId, BusMessage)>,
    tick: u64,
}

impl Runtime {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            variables: VariableStore::new(),
            modules: ModuleSet::new(),
            order: Vec::new(),
            variable_bindings: Vec::new(),
            module_bindings: Vec::new(),
            scratch: Vec::new(),
            outbox: Vec::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.config.logger
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Direct access for hosts, e.g. to subscribe modules to a bus
    pub fn modules_mut(&mut self) -> &mut ModuleSet {
        &mut self.modules
    }

    /// Number of ticks run so far; also the number of the next tick
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.variables, &self.modules)
    }

    // ==================== build ====================

    pub fn add_module(&mut self, module: Box<dyn Module>) -> Result<ModuleId, GeckoError> {
        let name = module.name().to_string();
        let kind = module.kind();
        let id = self.modules.add(module)?;
        self.order.push(id);
        self.module_bindings.push(Vec::new());
        debug!(self.config.logger, target: Phase::Build.target(), "module {name} ({kind}) registered as {id}");
        Ok(id)
    }

    pub fn declare(&mut self, name: &str, initial: Value) -> Result<VariableId, GeckoError> {
        let id = self.variables.declare(name, initial)?;
        debug!(self.config.logger, target: Phase::Build.target(), "variable {name}: {}", id.kind());
        Ok(id)
    }

    /// Re-evaluate `expr` into variable `name` at the start of every tick
    pub fn bind_variable(&mut self, name: &str, expr: Expression) -> Result<(), GeckoError> {
        let binding = Binding::variable(&self.context(), name, expr)?;
        debug!(self.config.logger, target: Phase::Build.target(), "bind {}", binding.label());
        self.variable_bindings.push(binding);
        Ok(())
    }

    /// Re-evaluate `expr` into `module.property` right before the module steps
    pub fn bind_property(
        &mut self,
        module: &str,
        property: &str,
        expr: Expression,
    ) -> Result<(), GeckoError> {
        let module_id = self.modules.resolve(module)?;
        let binding = Binding::property(&self.context(), module, property, expr)?;
        debug!(self.config.logger, target: Phase::Build.target(), "bind {}", binding.label());
        self.module_bindings[module_id.index()].push(binding);
        Ok(())
    }

    // ==================== calls ====================

    /// Evaluate `args` and invoke `module.method(args)`
    pub fn call(&mut self, module: &str, method: &str, args: &[Expression]) -> Result<(), GeckoError> {
        let id = self.modules.resolve(module)?;
        let ctx = self.context();
        for arg in args {
            arg.check_handles(&ctx)?;
        }
        let values = args
            .iter()
            .map(|arg| arg.evaluate(&ctx))
            .collect::<Result<Vec<_>, _>>()?;
        self.call_values(id, method, &values)
    }

    pub fn call_values(&mut self, id: ModuleId, method: &str, args: &[Value]) -> Result<(), GeckoError> {
        let module = self.modules.get_mut(id);
        info!(
            self.config.logger,
            target: Phase::Call.target(),
            "{}.{method}({})",
            module.name(),
            args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
        );
        module.call(method, args).map_err(|error| {
            warn!(self.config.logger, target: Phase::Call.target(), "{}.{method}() failed: {error}", module.name());
            GeckoError::module(module.name(), error)
        })
    }

    // ==================== ticks ====================

    /// Run one tick
    pub fn tick(&mut self) -> TickReport {
        let tick = self.tick;
        let _guard = self.config.logger.enter_tick(tick);
        let mut report = TickReport::new(tick);
        trace!(self.config.logger, target: Phase::Tick.target(), "tick start");

        for binding in &self.variable_bindings {
            let result = binding.evaluate(&EvalContext::new(&self.variables, &self.modules));
            let stored = result.map_err(GeckoError::from).and_then(|value| {
                binding
                    .store(&value, &mut self.variables, &mut self.modules)
                    .map_err(GeckoError::from)
            });
            if let Err(error) = stored {
                warn!(self.config.logger, target: Phase::Tick.target(), "{}: {error}", binding.label());
                report.push(None, binding.label().to_string(), error);
            }
        }

        for &id in &self.order {
            let bindings = &self.module_bindings[id.index()];

            // evaluate everything first so a module sees one consistent snapshot
            self.scratch.clear();
            let ctx = EvalContext::new(&self.variables, &self.modules);
            for binding in bindings {
                match binding.evaluate(&ctx) {
                    Ok(value) => self.scratch.push(Some(value)),
                    Err(error) => {
                        warn!(self.config.logger, target: Phase::Tick.target(), "{}: {error}", binding.label());
                        report.push(Some(id), binding.label().to_string(), error.into());
                        self.scratch.push(None);
                    }
                }
            }

            for (binding, value) in bindings.iter().zip(self.scratch.drain(..)) {
                let Some(value) = value else { continue };
                if let Err(error) = binding.store(&value, &mut self.variables, &mut self.modules) {
                    report.push(Some(id), binding.label().to_string(), error.into());
                }
            }

            let module = self.modules.get_mut(id);
            let mut step_ctx = StepContext::new(&self.config.logger, tick, &mut self.outbox);
            if let Err(error) = module.step(&mut step_ctx) {
                warn!(self.config.logger, target: Phase::Tick.target(), "{}.step(): {error}", module.name());
                report.push(
                    Some(id),
                    format!("{}.step()", module.name()),
                    GeckoError::module(module.name(), error),
                );
            }

            for (subscriber, message) in self.outbox.drain(..) {
                let target = self.modules.get_mut(subscriber);
                trace!(self.config.logger, target: Phase::Bus.target(), "deliver {message} to {}", target.name());
                report.delivered += 1;
                if let Err(error) = target.handle_message(&message) {
                    warn!(self.config.logger, target: Phase::Bus.target(), "{}: {error}", target.name());
                    report.push(
                        Some(subscriber),
                        format!("{}.handle_message()", target.name()),
                        GeckoError::module(target.name(), error),
                    );
                }
            }
        }

        self.tick += 1;
        report
    }

    /// Run ticks until `config.tick.max_ticks` (or forever), sleeping the
    /// configured interval between tick starts
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        let interval = Duration::from_millis(self.config.tick.interval_ms);
        info!(self.config.logger, target: Phase::Tick.target(), "running {} module(s)", self.modules.len());

        while self.config.tick.max_ticks.map_or(true, |max| self.tick < max) {
            let started = Instant::now();
            let report = self.tick();
            let failed = !report.is_ok();
            summary.record(report);
            if failed && self.config.stop_on_error {
                break;
            }
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }

        info!(self.config.logger, target: Phase::Tick.target(), "stopped after {} tick(s), {} error(s)", summary.ticks, summary.errors.len());
        summary
    }
}

/// Outcome of a multi-tick run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub delivered: usize,
    pub errors: Vec<TickError>,
}

impl RunSummary {
    pub fn record(&mut self, report: TickReport) {
        self.ticks += 1;
        self.delivered += report.delivered;
        self.errors.extend(report.errors);
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
