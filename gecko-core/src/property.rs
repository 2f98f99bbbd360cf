//! Module property registry
//!
//! Every module owns one registry, populated with defaults when the module is
//! built. The set of names is closed from then on; only values change.

use crate::error::{LookupError, ModuleError, TypeError};
use crate::types::Type;
use crate::variable::{
    BooleanVar, IntegerVar, NumberVar, StringVar, Value, VariableId, VariableStore,
};

/// Handle of a property cell
///
/// Kept apart from [`VariableId`] so a property cannot be passed where a
/// variable is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(VariableId);

impl PropertyId {
    pub fn kind(self) -> Type {
        self.0.kind()
    }

    /// The typed cell, for modules reading their own properties on the hot path
    pub fn cell(self) -> VariableId {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct PropertyRegistry {
    owner: String,
    store: VariableStore,
}

impl PropertyRegistry {
    /// Registry of `owner` with the given properties and their defaults.
    ///
    /// ```
    /// use gecko_core::{PropertyRegistry, Value};
    ///
    /// let props = PropertyRegistry::new(
    ///     "motor",
    ///     [("frequency", Value::Integer(1000)), ("duty", Value::Integer(128))],
    /// )
    /// .unwrap();
    /// assert_eq!(props.numeric("duty").unwrap(), 128.0);
    /// ```
    pub fn new<'n>(
        owner: impl Into<String>,
        defaults: impl IntoIterator<Item = (&'n str, Value)>,
    ) -> Result<Self, LookupError> {
        let mut store = VariableStore::new();
        for (name, value) in defaults {
            store.declare(name, value)?;
        }
        Ok(Self {
            owner: owner.into(),
            store,
        })
    }

    /// Name of the owning module
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn lookup(&self, name: &str) -> Option<PropertyId> {
        self.store.lookup(name).map(PropertyId)
    }

    pub fn resolve(&self, name: &str) -> Result<PropertyId, LookupError> {
        self.lookup(name).ok_or_else(|| LookupError::UnknownProperty {
            module: self.owner.clone(),
            property: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.store.iter().map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Whether `cell` is one of this registry's properties
    pub fn owns(&self, cell: VariableId) -> bool {
        self.store.owns(cell)
    }

    pub fn check(&self, cell: VariableId) -> Result<(), LookupError> {
        self.store.check(cell)
    }

    pub fn get(&self, id: PropertyId) -> Value {
        self.store.get(id.0)
    }

    pub fn set(&mut self, id: PropertyId, value: &Value) -> Result<(), TypeError> {
        self.store.set(id.0, value)
    }

    /// Set a property by name, for hosts and tests
    pub fn set_by_name(&mut self, name: &str, value: &Value) -> Result<(), ModuleError> {
        let id = self.resolve(name)?;
        self.set(id, value)?;
        Ok(())
    }

    /// Current value of a numbery property as a float
    pub fn numeric(&self, name: &str) -> Result<f64, ModuleError> {
        match self.resolve(name)?.cell() {
            VariableId::Integer(v) => Ok(self.store.integer(v) as f64),
            VariableId::Number(v) => Ok(self.store.number(v)),
            other => Err(TypeError::NotNumeric {
                name: name.to_string(),
                found: other.kind(),
            }
            .into()),
        }
    }

    pub fn boolean(&self, var: BooleanVar) -> bool {
        self.store.boolean(var)
    }

    pub fn integer(&self, var: IntegerVar) -> i64 {
        self.store.integer(var)
    }

    pub fn number(&self, var: NumberVar) -> f64 {
        self.store.number(var)
    }

    pub fn string(&self, var: StringVar) -> &str {
        self.store.string(var)
    }

    pub fn set_boolean(&mut self, var: BooleanVar, value: bool) {
        self.store.set_boolean(var, value)
    }

    pub fn set_integer(&mut self, var: IntegerVar, value: i64) {
        self.store.set_integer(var, value)
    }

    pub fn set_number(&mut self, var: NumberVar, value: f64) {
        self.store.set_number(var, value)
    }
}
