//! 测试辅助工具
//!
//! A gauge module with one property of every kind, plus a fixture that owns
//! variables and modules and hands out evaluation contexts.

#![allow(dead_code)]

use gecko_core::{
    EvalContext, Module, ModuleError, ModuleId, ModuleKind, ModuleSet, PropertyRegistry,
    StepContext, Value, VariableId, VariableStore,
};
use std::any::Any;

pub struct Gauge {
    name: String,
    props: PropertyRegistry,
    pub steps: u32,
}

impl Gauge {
    pub fn new(name: &str) -> Self {
        let props = PropertyRegistry::new(
            name,
            [
                ("armed", Value::Boolean(false)),
                ("count", Value::Integer(0)),
                ("level", Value::Number(0.0)),
                ("label", Value::String(String::new())),
            ],
        )
        .unwrap();
        Self {
            name: name.to_string(),
            props,
            steps: 0,
        }
    }
}

impl Module for Gauge {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Custom("gauge")
    }

    fn properties(&self) -> &PropertyRegistry {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.props
    }

    fn step(&mut self, _ctx: &mut StepContext<'_>) -> Result<(), ModuleError> {
        self.steps += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Variables plus a single gauge module named `gauge`
pub struct Fixture {
    pub vars: VariableStore,
    pub modules: ModuleSet,
    pub gauge: ModuleId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut modules = ModuleSet::new();
        let gauge = modules.add(Box::new(Gauge::new("gauge"))).unwrap();
        Self {
            vars: VariableStore::new(),
            modules,
            gauge,
        }
    }

    pub fn declare(&mut self, name: &str, value: Value) -> VariableId {
        self.vars.declare(name, value).unwrap()
    }

    pub fn ctx(&self) -> EvalContext<'_> {
        EvalContext::new(&self.vars, &self.modules)
    }

    pub fn set_property(&mut self, name: &str, value: Value) {
        self.modules
            .get_mut(self.gauge)
            .properties_mut()
            .set_by_name(name, &value)
            .unwrap();
    }
}
