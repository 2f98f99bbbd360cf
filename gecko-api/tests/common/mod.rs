//! 测试辅助工具

#![allow(dead_code)]

use gecko_api::gecko_core::{
    BusMessage, ModuleError, ModuleKind, PropertyRegistry, StepContext, Value,
};
use gecko_api::gecko_log::{info, Level, LogRingBuffer, Logger};
use gecko_api::{Module, RunConfig};
use std::any::Any;
use std::sync::Arc;

/// Logs every step, remembers every bus message, fails on demand
pub struct Recorder {
    name: String,
    props: PropertyRegistry,
    pub received: Vec<BusMessage>,
}

impl Recorder {
    pub fn new(name: &str) -> Self {
        let props = PropertyRegistry::new(
            name,
            [("value", Value::Integer(0)), ("fail", Value::Boolean(false))],
        )
        .unwrap();
        Self {
            name: name.to_string(),
            props,
            received: Vec::new(),
        }
    }

    pub fn boxed(name: &str) -> Box<dyn Module> {
        Box::new(Self::new(name))
    }
}

impl Module for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Custom("recorder")
    }

    fn properties(&self) -> &PropertyRegistry {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.props
    }

    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<(), ModuleError> {
        let value = self.get_property("value")?;
        info!(ctx.logger(), target: "test::step", "{} {}", self.name, value);
        let fail = self.props.lookup("fail").map(|id| self.props.get(id));
        if fail == Some(Value::Boolean(true)) {
            return Err(ModuleError::Transport(format!("{} failed", self.name)));
        }
        Ok(())
    }

    fn handle_message(&mut self, message: &BusMessage) -> Result<(), ModuleError> {
        self.received.push(*message);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Info-level logger writing into a ring buffer
pub fn recording_config() -> (RunConfig, Arc<LogRingBuffer>) {
    let ring = LogRingBuffer::new(1024);
    let logger = Logger::new(Level::Info).with_sink(ring.clone());
    (RunConfig::with_logger(logger), ring)
}

/// Messages logged by `Recorder::step`, in order
pub fn steps(ring: &LogRingBuffer) -> Vec<String> {
    ring.dump_records()
        .into_iter()
        .filter(|r| r.target == "test::step")
        .map(|r| r.message)
        .collect()
}
