//! Gecko Core - typed expression engine for module control scripts
//!
//! Building blocks, leaf first:
//!
//! - [`types`]: the four value kinds and numeric promotion
//! - [`variable`]: typed cells and their handles
//! - [`property`]: per-module property registries
//! - [`expression`]: checked expression trees and their evaluator
//! - [`module`]: the module contract and the module set
//! - [`binding`]: expressions assigned to variables or properties
//!
//! Nothing here owns a clock or a thread; the host drives ticks.

pub mod binding;
pub mod context;
pub mod error;
pub mod expression;
pub mod module;
pub mod property;
pub mod types;
pub mod variable;

pub use binding::{Binding, Target};
pub use context::EvalContext;
pub use error::{ArgumentError, CoreError, EvalError, LookupError, ModuleError, TypeError};
pub use expression::{
    ArithOp, BooleanExpr, CompareOp, Expression, IntegerExpr, NumberExpr, StringExpr,
};
pub use module::{
    default_call, expect_arguments, BusMessage, Module, ModuleId, ModuleKind, ModuleSet,
    StepContext,
};
pub use property::{PropertyId, PropertyRegistry};
pub use types::{check_comparison_types, check_logical_types, common_numeric_type, Type};
pub use variable::{
    BooleanVar, IntegerVar, NumberVar, StringVar, StoreId, Value, VariableId, VariableStore,
};

/// Re-exported so module implementors share one logger type
pub use gecko_log as log;
