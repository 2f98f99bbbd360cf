//! Type domain and promotion rules
//!
//! Every check here runs while an expression tree is being built, so a tree
//! that exists is already well typed.

use crate::error::TypeError;
use std::fmt;

/// Value kinds known to the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Boolean,
    Integer,
    Number,
    String,
}

impl Type {
    pub const ALL: [Type; 4] = [Type::Boolean, Type::Integer, Type::Number, Type::String];

    /// `Integer` or `Number`
    pub fn is_numbery(self) -> bool {
        matches!(self, Type::Integer | Type::Number)
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::Integer => "integer",
            Type::Number => "number",
            Type::String => "string",
        }
    }

    /// Whether a value of type `source` may be stored where `self` is expected.
    ///
    /// Exact matches only, plus `Integer` widening into `Number`.
    pub fn accepts(self, source: Type) -> bool {
        self == source || (self == Type::Number && source == Type::Integer)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result type of an arithmetic operation on `left` and `right`.
///
/// `Integer` when both sides are integers, `Number` when both are numbery.
pub fn common_numeric_type(left: Type, right: Type) -> Result<Type, TypeError> {
    match (left, right) {
        (Type::Integer, Type::Integer) => Ok(Type::Integer),
        (l, r) if l.is_numbery() && r.is_numbery() => Ok(Type::Number),
        _ => Err(TypeError::Arithmetic { left, right }),
    }
}

/// Both operands of a comparison must be numbery
pub fn check_comparison_types(left: Type, right: Type) -> Result<(), TypeError> {
    if left.is_numbery() && right.is_numbery() {
        Ok(())
    } else {
        Err(TypeError::Comparison { left, right })
    }
}

/// Both operands of `and`/`or`/`not` must be exactly boolean
pub fn check_logical_types(left: Type, right: Type) -> Result<(), TypeError> {
    if left == Type::Boolean && right == Type::Boolean {
        Ok(())
    } else {
        Err(TypeError::Logical { left, right })
    }
}
