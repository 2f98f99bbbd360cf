use crate::hardware::PwmDriver;
use gecko_core::{
    default_call, expect_arguments, IntegerVar, Module, ModuleError, ModuleKind,
    PropertyRegistry, StepContext, Value, VariableId,
};
use std::any::Any;

/// A PWM output channel.
///
/// Properties: `frequency` (integer, Hz, default 1000) and `duty` (integer,
/// default 128). The output is configured with the defaults and paused until
/// `on()` is called.
pub struct PwmOutput<D> {
    name: String,
    props: PropertyRegistry,
    frequency: IntegerVar,
    duty: IntegerVar,
    driver: D,
}

impl<D: PwmDriver + 'static> PwmOutput<D> {
    pub const DEFAULT_FREQUENCY: i64 = 1000;
    pub const DEFAULT_DUTY: i64 = 128;

    pub fn new(name: impl Into<String>, mut driver: D) -> Result<Self, ModuleError> {
        let name = name.into();
        let props = PropertyRegistry::new(
            name.as_str(),
            [
                ("frequency", Value::Integer(Self::DEFAULT_FREQUENCY)),
                ("duty", Value::Integer(Self::DEFAULT_DUTY)),
            ],
        )?;
        let (VariableId::Integer(frequency), VariableId::Integer(duty)) =
            (props.resolve("frequency")?.cell(), props.resolve("duty")?.cell())
        else {
            return Err(ModuleError::Config(format!("{name}: malformed property table")));
        };

        driver.configure(Self::DEFAULT_FREQUENCY as u32, Self::DEFAULT_DUTY as u32)?;
        driver.pause()?;

        Ok(Self {
            name,
            props,
            frequency,
            duty,
            driver,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn hardware_value(&self, property: &str, value: i64) -> Result<u32, ModuleError> {
        u32::try_from(value).map_err(|_| {
            ModuleError::Config(format!("{}.{property} out of range: {value}", self.name))
        })
    }
}

impl<D: PwmDriver + 'static> Module for PwmOutput<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::PwmOutput
    }

    fn properties(&self) -> &PropertyRegistry {
        &self.props
    }

    fn properties_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.props
    }

    fn step(&mut self, _ctx: &mut StepContext<'_>) -> Result<(), ModuleError> {
        let frequency = self.hardware_value("frequency", self.props.integer(self.frequency))?;
        self.driver.set_frequency(frequency)?;
        let duty = self.hardware_value("duty", self.props.integer(self.duty))?;
        self.driver.set_duty(duty)?;
        Ok(())
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<(), ModuleError> {
        match method {
            "on" => {
                expect_arguments(method, args, &[])?;
                self.driver.resume()?;
                Ok(())
            }
            "off" => {
                expect_arguments(method, args, &[])?;
                self.driver.pause()?;
                Ok(())
            }
            _ => default_call(&self.name, method),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
