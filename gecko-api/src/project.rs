//! Project files
//!
//! A project describes variables, modules, bindings and scheduled calls as
//! JSON. Expression trees are given as nested objects, e.g.
//! `{"mul": [{"var": "speed"}, {"int": 20}]}`; every tree is type checked
//! while the project is built, before the first tick.
//!
//! Modules are built on the simulated drivers in [`crate::hardware`].

use crate::config::RunConfig;
use crate::error::GeckoError;
use crate::hardware::{SimBus, SimPwm};
use crate::modules::can::MAX_ID;
use crate::modules::{Can, PwmOutput};
use crate::runtime::{RunSummary, Runtime, TickReport};
use gecko_config::{BusConfig, Phase, TickConfig};
use gecko_core::{
    ArithOp, BusMessage, CompareOp, Expression, Module, ModuleId, ModuleSet, Value,
    VariableStore,
};
use gecko_log::{debug, info, warn, Logger};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Project {
    pub tick: TickConfig,
    pub bus: BusConfig,
    pub variables: Vec<VariableDecl>,
    pub modules: Vec<ModuleDecl>,
    pub bindings: Vec<BindingDecl>,
    pub calls: Vec<CallDecl>,
    /// Inbound bus frames to inject, for simulation
    pub frames: Vec<FrameDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub value: Literal,
}

/// A typed initial value: `{"integer": 3}`, `{"number": 0.5}`, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Boolean(b) => Value::Boolean(b),
            Literal::Integer(i) => Value::Integer(i),
            Literal::Number(n) => Value::Number(n),
            Literal::String(s) => Value::String(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleDecl {
    PwmOutput {
        name: String,
    },
    Can {
        name: String,
        baud_rate: u32,
        /// Log every received frame
        #[serde(default)]
        output: bool,
        /// Receive own transmissions
        #[serde(default)]
        loopback: bool,
        #[serde(default)]
        subscriptions: Vec<Subscription>,
    },
}

impl ModuleDecl {
    pub fn name(&self) -> &str {
        match self {
            ModuleDecl::PwmOutput { name } | ModuleDecl::Can { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: u32,
    pub module: String,
}

/// `target` is a variable name or `module.property`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDecl {
    pub target: String,
    pub expr: ExprDecl,
}

/// `module.method(args)` right before tick `tick`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDecl {
    pub tick: u64,
    pub module: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<ExprDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDecl {
    pub tick: u64,
    pub bus: String,
    pub id: u32,
    #[serde(default)]
    pub data: Vec<u8>,
    #[serde(default)]
    pub rtr: bool,
}

/// Expression tree as written in a project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprDecl {
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    Var(String),
    /// `module.property`
    Prop(String),
    Neg(Box<ExprDecl>),
    Not(Box<ExprDecl>),
    Pow(Box<[ExprDecl; 2]>),
    Mul(Box<[ExprDecl; 2]>),
    Div(Box<[ExprDecl; 2]>),
    Add(Box<[ExprDecl; 2]>),
    Sub(Box<[ExprDecl; 2]>),
    Gt(Box<[ExprDecl; 2]>),
    Lt(Box<[ExprDecl; 2]>),
    Ge(Box<[ExprDecl; 2]>),
    Le(Box<[ExprDecl; 2]>),
    Eq(Box<[ExprDecl; 2]>),
    Ne(Box<[ExprDecl; 2]>),
    And(Box<[ExprDecl; 2]>),
    Or(Box<[ExprDecl; 2]>),
}

fn check_bus_id(id: u32, what: &str) -> Result<(), GeckoError> {
    if id > MAX_ID {
        return Err(GeckoError::Project(format!("{what} id {id:#x} exceeds 29 bits")));
    }
    Ok(())
}

fn split_target(target: &str) -> Option<(&str, &str)> {
    target.split_once('.')
}

impl ExprDecl {
    /// Build and type check the tree
    pub fn build(&self, variables: &VariableStore, modules: &ModuleSet) -> Result<Expression, GeckoError> {
        let arith = |op: ArithOp, operands: &[ExprDecl; 2]| -> Result<Expression, GeckoError> {
            let (l, r) = build_pair(operands, variables, modules)?;
            Ok(Expression::arithmetic(op, l, r)?)
        };
        let compare = |op: CompareOp, operands: &[ExprDecl; 2]| -> Result<Expression, GeckoError> {
            let (l, r) = build_pair(operands, variables, modules)?;
            Ok(Expression::compare(op, l, r)?)
        };

        match self {
            ExprDecl::Bool(b) => Ok(Expression::boolean(*b)),
            ExprDecl::Int(i) => Ok(Expression::integer(*i)),
            ExprDecl::Num(n) => Ok(Expression::number(*n)),
            ExprDecl::Str(s) => Ok(Expression::string(s.as_str())),
            ExprDecl::Var(name) => Ok(Expression::variable(variables.resolve(name)?)),
            ExprDecl::Prop(path) => {
                let (module, property) = split_target(path).ok_or_else(|| {
                    GeckoError::Project(format!("property reference '{path}' is not module.property"))
                })?;
                Ok(Expression::property(modules, module, property)?)
            }
            ExprDecl::Neg(operand) => Ok(Expression::negate(operand.build(variables, modules)?)?),
            ExprDecl::Not(operand) => {
                Ok(Expression::logical_not(operand.build(variables, modules)?)?)
            }
            ExprDecl::Pow(ops) => arith(ArithOp::Power, ops),
            ExprDecl::Mul(ops) => arith(ArithOp::Multiply, ops),
            ExprDecl::Div(ops) => arith(ArithOp::Divide, ops),
            ExprDecl::Add(ops) => arith(ArithOp::Add, ops),
            ExprDecl::Sub(ops) => arith(ArithOp::Subtract, ops),
            ExprDecl::Gt(ops) => compare(CompareOp::Greater, ops),
            ExprDecl::Lt(ops) => compare(CompareOp::Less, ops),
            ExprDecl::Ge(ops) => compare(CompareOp::GreaterEqual, ops),
            ExprDecl::Le(ops) => compare(CompareOp::LessEqual, ops),
            ExprDecl::Eq(ops) => compare(CompareOp::Equal, ops),
            ExprDecl::Ne(ops) => compare(CompareOp::NotEqual, ops),
            ExprDecl::And(ops) => {
                let (l, r) = build_pair(ops, variables, modules)?;
                Ok(Expression::and(l, r)?)
            }
            ExprDecl::Or(ops) => {
                let (l, r) = build_pair(ops, variables, modules)?;
                Ok(Expression::or(l, r)?)
            }
        }
    }
}

fn build_pair(
    operands: &[ExprDecl; 2],
    variables: &VariableStore,
    modules: &ModuleSet,
) -> Result<(Expression, Expression), GeckoError> {
    let [left, right] = operands;
    Ok((left.build(variables, modules)?, right.build(variables, modules)?))
}

impl Project {
    pub fn from_json(source: &str) -> Result<Self, GeckoError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeckoError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Run configuration with this project's tick and bus settings
    pub fn run_config(&self, logger: Arc<Logger>) -> RunConfig {
        RunConfig {
            tick: self.tick,
            bus: self.bus,
            ..RunConfig::with_logger(logger)
        }
    }

    /// Build modules, variables and bindings, in that order
    pub fn build(&self, config: RunConfig) -> Result<Session, GeckoError> {
        let bus_config = config.bus;
        let mut runtime = Runtime::new(config);
        let logger = Arc::clone(runtime.logger());

        for decl in &self.modules {
            let name = decl.name();
            let module: Box<dyn Module> = match decl {
                ModuleDecl::PwmOutput { .. } => Box::new(
                    PwmOutput::new(name, SimPwm::new())
                        .map_err(|e| GeckoError::module(name, e))?,
                ),
                ModuleDecl::Can {
                    baud_rate,
                    output,
                    loopback,
                    ..
                } => {
                    let transceiver = if *loopback { SimBus::loopback() } else { SimBus::new() };
                    let mut can = Can::new(name, transceiver, *baud_rate, &bus_config)
                        .map_err(|e| GeckoError::module(name, e))?;
                    can.properties_mut()
                        .set_by_name("output", &Value::Boolean(*output))
                        .map_err(|e| GeckoError::module(name, e))?;
                    Box::new(can)
                }
            };
            runtime.add_module(module)?;
        }

        // subscriptions may point at modules declared after the bus
        for decl in &self.modules {
            let ModuleDecl::Can {
                name,
                subscriptions,
                ..
            } = decl
            else {
                continue;
            };
            let bus = runtime.modules().resolve(name)?;
            for sub in subscriptions {
                check_bus_id(sub.id, "subscription")?;
                let subscriber = runtime.modules().resolve(&sub.module)?;
                let can = runtime
                    .modules_mut()
                    .downcast_mut::<Can<SimBus>>(bus)
                    .ok_or_else(|| GeckoError::Project(format!("'{name}' is not a bus")))?;
                can.subscribe(sub.id, subscriber)?;
                debug!(logger, target: Phase::Build.target(), "{name}: {:#x} -> {}", sub.id, sub.module);
            }
        }

        for decl in &self.variables {
            runtime.declare(&decl.name, decl.value.clone().into())?;
        }

        for decl in &self.bindings {
            let expr = decl.expr.build(runtime.variables(), runtime.modules())?;
            match split_target(&decl.target) {
                Some((module, property)) => runtime.bind_property(module, property, expr)?,
                None => runtime.bind_variable(&decl.target, expr)?,
            }
        }

        let mut calls = Vec::with_capacity(self.calls.len());
        for decl in &self.calls {
            let module = runtime.modules().resolve(&decl.module)?;
            let args = decl
                .args
                .iter()
                .map(|arg| arg.build(runtime.variables(), runtime.modules()))
                .collect::<Result<Vec<_>, _>>()?;
            calls.push(ScheduledCall {
                tick: decl.tick,
                module,
                method: decl.method.clone(),
                args,
            });
        }
        calls.sort_by_key(|call| call.tick);

        let mut frames = Vec::with_capacity(self.frames.len());
        for decl in &self.frames {
            let bus = runtime.modules().resolve(&decl.bus)?;
            if runtime.modules().downcast_ref::<Can<SimBus>>(bus).is_none() {
                return Err(GeckoError::Project(format!("'{}' is not a bus", decl.bus)));
            }
            check_bus_id(decl.id, "frame")?;
            if decl.data.len() > 8 {
                return Err(GeckoError::Project(format!(
                    "frame {:#x} carries {} bytes, at most 8 fit",
                    decl.id,
                    decl.data.len()
                )));
            }
            let message = if decl.rtr {
                BusMessage::remote(decl.id)
            } else {
                BusMessage::new(decl.id, &decl.data)
            };
            frames.push((decl.tick, bus, message));
        }
        frames.sort_by_key(|(tick, _, _)| *tick);

        info!(
            logger,
            target: Phase::Build.target(),
            "project built: {} module(s), {} variable(s), {} binding(s)",
            self.modules.len(),
            self.variables.len(),
            self.bindings.len()
        );

        Ok(Session {
            runtime,
            calls,
            frames,
        })
    }
}

#[derive(Debug, Clone)]
struct ScheduledCall {
    tick: u64,
    module: ModuleId,
    method: String,
    args: Vec<Expression>,
}

/// A built project: the runtime plus its scheduled calls and frames
pub struct Session {
    runtime: Runtime,
    calls: Vec<ScheduledCall>,
    frames: Vec<(u64, ModuleId, BusMessage)>,
}

impl Session {
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    /// Inject due frames, run due calls, then tick
    pub fn tick(&mut self) -> TickReport {
        let tick = self.runtime.tick_count();
        let logger = Arc::clone(self.runtime.logger());
        let mut call_errors = Vec::new();

        for (_, bus, message) in self.frames.iter().filter(|(t, _, _)| *t == tick) {
            let injected = self
                .runtime
                .modules_mut()
                .downcast_mut::<Can<SimBus>>(*bus)
                .map(|can| can.transceiver_mut().inject(*message))
                .unwrap_or(false);
            if !injected {
                warn!(logger, target: Phase::Bus.target(), "frame {message} dropped");
            }
        }

        for call in self.calls.iter().filter(|c| c.tick == tick) {
            let values = {
                let ctx = self.runtime.context();
                call.args
                    .iter()
                    .map(|arg| arg.evaluate(&ctx))
                    .collect::<Result<Vec<_>, _>>()
            };
            let result = match values {
                Ok(values) => self.runtime.call_values(call.module, &call.method, &values),
                Err(error) => Err(GeckoError::Eval(error)),
            };
            if let Err(error) = result {
                let name = self.runtime.modules().get(call.module).name();
                call_errors.push((call.module, format!("{name}.{}()", call.method), error));
            }
        }

        let mut report = self.runtime.tick();
        let step_errors = std::mem::take(&mut report.errors);
        for (module, origin, error) in call_errors {
            report.push(Some(module), origin, error);
        }
        report.errors.extend(step_errors);
        report
    }

    /// Tick until the configured limit, pacing ticks like [`Runtime::run`]
    pub fn run(&mut self) -> RunSummary {
        let tick_config = self.runtime.config().tick;
        let stop_on_error = self.runtime.config().stop_on_error;
        let interval = Duration::from_millis(tick_config.interval_ms);
        let mut summary = RunSummary::default();

        while tick_config
            .max_ticks
            .map_or(true, |max| self.runtime.tick_count() < max)
        {
            let started = Instant::now();
            let report = self.tick();
            let failed = !report.is_ok();
            summary.record(report);
            if failed && stop_on_error {
                break;
            }
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        summary
    }
}

/// Load, build and run a project in one go
pub fn run(project: &Project, config: RunConfig) -> Result<RunSummary, GeckoError> {
    let mut session = project.build(config)?;
    Ok(session.run())
}
