//! Error taxonomy of the core
//!
//! Construction-time errors (`TypeError`, `LookupError`) keep a tree, binding
//! or module out of the tick loop. Per-tick errors (`EvalError`,
//! `ModuleError`) are scoped to the module that raised them.

use crate::types::Type;
use thiserror::Error;

/// Operand types violate the promotion or compatibility rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid type for arithmetic operation: {left} and {right}")]
    Arithmetic { left: Type, right: Type },

    #[error("invalid type for comparison: {left} and {right}")]
    Comparison { left: Type, right: Type },

    #[error("invalid type for logical operation: {left} and {right}")]
    Logical { left: Type, right: Type },

    /// Writing a value into a variable or property of another kind
    #[error("cannot assign {found} to '{target}' of type {expected}")]
    Assignment {
        target: String,
        expected: Type,
        found: Type,
    },

    /// Numeric read of a boolean or string property
    #[error("property '{name}' is {found}, not numeric")]
    NotNumeric { name: String, found: Type },
}

/// A name could not be resolved, or is already taken
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("module '{module}' has no property '{property}'")]
    UnknownProperty { module: String, property: String },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("module '{0}' already exists")]
    DuplicateModule(String),

    #[error("'{0}' is already declared")]
    DuplicateVariable(String),

    #[error("there is already a subscriber for bus id {id:#x}")]
    DuplicateSubscription { id: u32 },

    #[error("{kind} handle was not issued by this store")]
    ForeignHandle { kind: Type },
}

/// Evaluation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An entry point that does not match the expression's result type.
    /// Only reachable through the untyped `Expression` surface.
    #[error("cannot evaluate {actual} expression as {requested}")]
    InvalidOperation { requested: Type, actual: Type },

    #[error("integer division by zero")]
    DivisionByZero,
}

/// Arguments of a module method call do not match its signature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("{method}() expects {expected} argument(s), got {found}")]
    Count {
        method: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {position} of {method}() must be {expected}, got {found}")]
    Type {
        method: String,
        position: usize,
        expected: Type,
        found: Type,
    },

    #[error("argument {position} of {method}() is out of range: {value}")]
    Range {
        method: String,
        position: usize,
        value: i64,
    },
}

/// Errors raised by a module's `step`, `call` or message handler
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("module '{module}' has no method '{method}'")]
    UnknownMethod { module: String, method: String },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// Hardware or bus transport failure
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Unified core error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("module error: {0}")]
    Module(#[from] ModuleError),
}
