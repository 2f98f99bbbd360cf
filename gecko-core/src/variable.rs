//! Typed variable cells
//!
//! A [`VariableStore`] owns the cells; everybody else holds typed handles.
//! Each kind lives in its own column, so a handle like [`IntegerVar`] can only
//! ever read an `i64` and the kind of a variable is fixed for its lifetime.
//!
//! Handles are stamped with the [`StoreId`] of the store that issued them;
//! [`VariableStore::check`] rejects handles from anywhere else.

use crate::error::{LookupError, TypeError};
use crate::types::Type;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// A value of one of the four kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl Value {
    pub fn kind(&self) -> Type {
        match self {
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
        }
    }

    /// Numeric view, widening integers
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Value::Integer(i) => Some(i as f64),
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match *self {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
        }
    }
}

static NEXT_STORE: AtomicU32 = AtomicU32::new(0);

/// Identity of the [`VariableStore`] that issued a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u32);

impl StoreId {
    fn next() -> Self {
        StoreId(NEXT_STORE.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanVar {
    store: StoreId,
    index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerVar {
    store: StoreId,
    index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberVar {
    store: StoreId,
    index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringVar {
    store: StoreId,
    index: u32,
}

/// Stable identity of a variable; the variant is its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableId {
    Boolean(BooleanVar),
    Integer(IntegerVar),
    Number(NumberVar),
    String(StringVar),
}

impl VariableId {
    pub fn kind(self) -> Type {
        match self {
            VariableId::Boolean(_) => Type::Boolean,
            VariableId::Integer(_) => Type::Integer,
            VariableId::Number(_) => Type::Number,
            VariableId::String(_) => Type::String,
        }
    }

    pub fn store(self) -> StoreId {
        self.slot().0
    }

    fn slot(self) -> (StoreId, usize) {
        match self {
            VariableId::Boolean(v) => (v.store, v.index as usize),
            VariableId::Integer(v) => (v.store, v.index as usize),
            VariableId::Number(v) => (v.store, v.index as usize),
            VariableId::String(v) => (v.store, v.index as usize),
        }
    }
}

/// Owning store of named, typed cells
///
/// A clone keeps the [`StoreId`], so handles stay valid for both copies.
#[derive(Debug, Clone)]
pub struct VariableStore {
    id: StoreId,
    booleans: Vec<bool>,
    integers: Vec<i64>,
    numbers: Vec<f64>,
    strings: Vec<String>,
    names: HashMap<String, VariableId>,
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl Default for VariableStore {
    fn default() -> Self {
        Self {
            id: StoreId::next(),
            booleans: Vec::new(),
            integers: Vec::new(),
            numbers: Vec::new(),
            strings: Vec::new(),
            names: HashMap::new(),
        }
    }
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Declare a new cell holding `initial`; its kind is the kind of `initial`
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        initial: Value,
    ) -> Result<VariableId, LookupError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(LookupError::DuplicateVariable(name));
        }

        let id = match initial {
            Value::Boolean(b) => {
                self.booleans.push(b);
                VariableId::Boolean(BooleanVar {
                    store: self.id,
                    index: next_index(self.booleans.len() - 1),
                })
            }
            Value::Integer(i) => {
                self.integers.push(i);
                VariableId::Integer(IntegerVar {
                    store: self.id,
                    index: next_index(self.integers.len() - 1),
                })
            }
            Value::Number(n) => {
                self.numbers.push(n);
                VariableId::Number(NumberVar {
                    store: self.id,
                    index: next_index(self.numbers.len() - 1),
                })
            }
            Value::String(s) => {
                self.strings.push(s);
                VariableId::String(StringVar {
                    store: self.id,
                    index: next_index(self.strings.len() - 1),
                })
            }
        };
        self.names.insert(name, id);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<VariableId> {
        self.names.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<VariableId, LookupError> {
        self.lookup(name)
            .ok_or_else(|| LookupError::UnknownVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Name a handle was declared under (slow path, error messages)
    pub fn name_of(&self, id: VariableId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, VariableId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `id` was issued by this store and still points at a cell
    pub fn owns(&self, id: VariableId) -> bool {
        let (store, index) = id.slot();
        let len = match id {
            VariableId::Boolean(_) => self.booleans.len(),
            VariableId::Integer(_) => self.integers.len(),
            VariableId::Number(_) => self.numbers.len(),
            VariableId::String(_) => self.strings.len(),
        };
        store == self.id && index < len
    }

    pub fn check(&self, id: VariableId) -> Result<(), LookupError> {
        if self.owns(id) {
            Ok(())
        } else {
            Err(LookupError::ForeignHandle { kind: id.kind() })
        }
    }

    // The typed accessors index directly; handles from another store panic
    // here, so trees are checked before they reach the tick loop.

    pub fn boolean(&self, var: BooleanVar) -> bool {
        self.booleans[var.index as usize]
    }

    pub fn integer(&self, var: IntegerVar) -> i64 {
        self.integers[var.index as usize]
    }

    pub fn number(&self, var: NumberVar) -> f64 {
        self.numbers[var.index as usize]
    }

    pub fn string(&self, var: StringVar) -> &str {
        &self.strings[var.index as usize]
    }

    pub fn set_boolean(&mut self, var: BooleanVar, value: bool) {
        self.booleans[var.index as usize] = value;
    }

    pub fn set_integer(&mut self, var: IntegerVar, value: i64) {
        self.integers[var.index as usize] = value;
    }

    pub fn set_number(&mut self, var: NumberVar, value: f64) {
        self.numbers[var.index as usize] = value;
    }

    /// Overwrites in place, reusing the cell's buffer
    pub fn set_string(&mut self, var: StringVar, value: &str) {
        let cell = &mut self.strings[var.index as usize];
        cell.clear();
        cell.push_str(value);
    }

    /// Current value of any cell
    pub fn get(&self, id: VariableId) -> Value {
        match id {
            VariableId::Boolean(v) => Value::Boolean(self.boolean(v)),
            VariableId::Integer(v) => Value::Integer(self.integer(v)),
            VariableId::Number(v) => Value::Number(self.number(v)),
            VariableId::String(v) => Value::String(self.string(v).to_string()),
        }
    }

    /// Store `value` into `id`.
    ///
    /// The value must have the cell's kind; integers are widened into number
    /// cells.
    pub fn set(&mut self, id: VariableId, value: &Value) -> Result<(), TypeError> {
        match (id, value) {
            (VariableId::Boolean(v), Value::Boolean(b)) => self.set_boolean(v, *b),
            (VariableId::Integer(v), Value::Integer(i)) => self.set_integer(v, *i),
            (VariableId::Number(v), Value::Number(n)) => self.set_number(v, *n),
            (VariableId::Number(v), Value::Integer(i)) => self.set_number(v, *i as f64),
            (VariableId::String(v), Value::String(s)) => self.set_string(v, s),
            _ => {
                return Err(TypeError::Assignment {
                    target: self.name_of(id).unwrap_or("?").to_string(),
                    expected: id.kind(),
                    found: value.kind(),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_and_read() {
        let mut store = VariableStore::new();
        let speed = store.declare("speed", Value::Integer(3)).unwrap();
        let gain = store.declare("gain", Value::Number(0.5)).unwrap();

        assert_eq!(speed.kind(), Type::Integer);
        assert_eq!(store.get(speed), Value::Integer(3));
        assert_eq!(store.get(gain), Value::Number(0.5));
        assert_eq!(store.lookup("speed"), Some(speed));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_declaration() {
        let mut store = VariableStore::new();
        store.declare("x", Value::Boolean(true)).unwrap();
        let err = store.declare("x", Value::Integer(1)).unwrap_err();
        assert_eq!(err, LookupError::DuplicateVariable("x".into()));
    }

    #[test]
    fn last_write_wins() {
        let mut store = VariableStore::new();
        let name = store.declare("label", Value::String("a".into())).unwrap();
        store.set(name, &Value::String("b".into())).unwrap();
        store.set(name, &Value::String("c".into())).unwrap();
        assert_eq!(store.get(name), Value::String("c".into()));
    }

    #[test]
    fn set_widens_integer_into_number() {
        let mut store = VariableStore::new();
        let n = store.declare("n", Value::Number(1.5)).unwrap();
        store.set(n, &Value::Integer(4)).unwrap();
        assert_eq!(store.get(n), Value::Number(4.0));
    }

    #[test]
    fn set_rejects_other_kinds() {
        let mut store = VariableStore::new();
        let i = store.declare("i", Value::Integer(1)).unwrap();
        let err = store.set(i, &Value::Number(2.5)).unwrap_err();
        assert_eq!(
            err,
            TypeError::Assignment {
                target: "i".into(),
                expected: Type::Integer,
                found: Type::Number,
            }
        );
        assert_eq!(store.get(i), Value::Integer(1));
    }

    #[test]
    fn handles_belong_to_their_store() {
        let mut store = VariableStore::new();
        let mut other = VariableStore::new();
        let x = store.declare("x", Value::Integer(1)).unwrap();
        let y = other.declare("y", Value::Integer(2)).unwrap();
        let z = other.declare("z", Value::Integer(3)).unwrap();

        assert!(store.owns(x));
        assert_ne!(x.store(), y.store());
        // same index, different store
        assert!(!store.owns(y));
        assert_eq!(
            store.check(z),
            Err(LookupError::ForeignHandle {
                kind: Type::Integer
            })
        );
        assert!(store.clone().owns(x));
    }

    #[test]
    fn resolve_unknown() {
        let store = VariableStore::new();
        assert_eq!(
            store.resolve("nope"),
            Err(LookupError::UnknownVariable("nope".into()))
        );
    }
}
