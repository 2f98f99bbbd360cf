//! Module contract
//!
//! A module is a named hardware abstraction with a fixed set of typed
//! properties. The host steps every module once per tick in registration
//! order; scripts call its methods out of band.

use crate::error::{ArgumentError, LookupError, ModuleError};
use crate::property::PropertyRegistry;
use crate::types::Type;
use crate::variable::Value;
use gecko_log::Logger;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Index of a module inside its [`ModuleSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    PwmOutput,
    Can,
    /// Host-defined modules
    Custom(&'static str),
}

impl ModuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::PwmOutput => "pwm_output",
            ModuleKind::Can => "can",
            ModuleKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frame on the message bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusMessage {
    /// Arbitration identifier
    pub id: u32,
    pub data: [u8; 8],
    /// Data length code, 0..=8
    pub len: u8,
    /// Remote transmission request (no payload)
    pub rtr: bool,
}

impl BusMessage {
    pub fn new(id: u32, payload: &[u8]) -> Self {
        let len = payload.len().min(8);
        let mut data = [0u8; 8];
        data[..len].copy_from_slice(&payload[..len]);
        Self {
            id,
            data,
            len: len as u8,
            rtr: false,
        }
    }

    pub fn remote(id: u32) -> Self {
        Self {
            id,
            rtr: true,
            ..Self::default()
        }
    }

    /// Payload bytes; empty for remote frames
    pub fn payload(&self) -> &[u8] {
        if self.rtr {
            &[]
        } else {
            &self.data[..usize::from(self.len.min(8))]
        }
    }
}

impl fmt::Display for BusMessage {
    /// `1a2,01,02` style, matching the firmware console output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03x}", self.id)?;
        for byte in self.payload() {
            write!(f, ",{byte:02x}")?;
        }
        Ok(())
    }
}

/// Per-step services handed to [`Module::step`]
pub struct StepContext<'a> {
    logger: &'a Arc<Logger>,
    tick: u64,
    outbox: &'a mut Vec<(ModuleId, BusMessage)>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        logger: &'a Arc<Logger>,
        tick: u64,
        outbox: &'a mut Vec<(ModuleId, BusMessage)>,
    ) -> Self {
        Self {
            logger,
            tick,
            outbox,
        }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        self.logger
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Queue `message` for delivery to `subscriber` after this step returns
    pub fn forward(&mut self, subscriber: ModuleId, message: BusMessage) {
        self.outbox.push((subscriber, message));
    }
}

pub trait Module: Any {
    fn name(&self) -> &str;

    fn kind(&self) -> ModuleKind;

    fn properties(&self) -> &PropertyRegistry;

    fn properties_mut(&mut self) -> &mut PropertyRegistry;

    /// Current value of a numeric property
    fn get_property(&self, name: &str) -> Result<f64, ModuleError> {
        self.properties().numeric(name)
    }

    /// Push properties to hardware and do per-tick work
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<(), ModuleError>;

    /// Invoke a script-visible method; unknown names end in [`default_call`]
    fn call(&mut self, method: &str, _args: &[Value]) -> Result<(), ModuleError> {
        default_call(self.name(), method)
    }

    /// A bus message this module subscribed to
    fn handle_message(&mut self, _message: &BusMessage) -> Result<(), ModuleError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Base method handler: no method is known here
pub fn default_call(module: &str, method: &str) -> Result<(), ModuleError> {
    Err(ModuleError::UnknownMethod {
        module: module.to_string(),
        method: method.to_string(),
    })
}

/// Check `args` against a method signature, position by position
pub fn expect_arguments(
    method: &str,
    args: &[Value],
    signature: &[Type],
) -> Result<(), ArgumentError> {
    if args.len() != signature.len() {
        return Err(ArgumentError::Count {
            method: method.to_string(),
            expected: signature.len(),
            found: args.len(),
        });
    }
    for (position, (arg, expected)) in args.iter().zip(signature).enumerate() {
        if arg.kind() != *expected {
            return Err(ArgumentError::Type {
                method: method.to_string(),
                position: position + 1,
                expected: *expected,
                found: arg.kind(),
            });
        }
    }
    Ok(())
}

/// Modules in registration order, addressable by name or [`ModuleId`]
#[derive(Default)]
pub struct ModuleSet {
    modules: Vec<Box<dyn Module>>,
    names: HashMap<String, ModuleId>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: Box<dyn Module>) -> Result<ModuleId, LookupError> {
        let name = module.name().to_string();
        if self.names.contains_key(&name) {
            return Err(LookupError::DuplicateModule(name));
        }
        let id = ModuleId(u32::try_from(self.modules.len()).unwrap_or(u32::MAX));
        self.modules.push(module);
        self.names.insert(name, id);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<ModuleId> {
        self.names.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<ModuleId, LookupError> {
        self.lookup(name)
            .ok_or_else(|| LookupError::UnknownModule(name.to_string()))
    }

    pub fn get(&self, id: ModuleId) -> &dyn Module {
        self.modules[id.index()].as_ref()
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut dyn Module {
        self.modules[id.index()].as_mut()
    }

    pub fn properties(&self, id: ModuleId) -> &PropertyRegistry {
        self.get(id).properties()
    }

    /// Concrete module behind `id`, if it is a `T`
    pub fn downcast_ref<T: Module>(&self, id: ModuleId) -> Option<&T> {
        self.modules.get(id.index())?.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Module>(&mut self, id: ModuleId) -> Option<&mut T> {
        self.modules
            .get_mut(id.index())?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len() as u32).map(ModuleId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &dyn Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| (m.name(), m.kind())))
            .finish()
    }
}
