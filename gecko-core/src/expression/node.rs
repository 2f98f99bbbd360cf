//! Typed expression nodes
//!
//! One enum per result type. A child of the wrong type cannot be expressed,
//! so the inner evaluators never need a type check.

use crate::module::ModuleId;
use crate::variable::{BooleanVar, IntegerVar, NumberVar, StringVar};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Power,
    Multiply,
    Divide,
    Add,
    Subtract,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Power => "^",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Greater => ">",
            CompareOp::Less => "<",
            CompareOp::GreaterEqual => ">=",
            CompareOp::LessEqual => "<=",
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
        }
    }

    pub(crate) fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Greater => left > right,
            CompareOp::Less => left < right,
            CompareOp::GreaterEqual => left >= right,
            CompareOp::LessEqual => left <= right,
            CompareOp::Equal => left == right,
            CompareOp::NotEqual => left != right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BooleanExpr {
    Literal(bool),
    Variable(BooleanVar),
    Property(ModuleId, BooleanVar),
    Not(Box<BooleanExpr>),
    And(Box<BooleanExpr>, Box<BooleanExpr>),
    Or(Box<BooleanExpr>, Box<BooleanExpr>),
    /// Comparisons always look at both sides as numbers
    Compare(CompareOp, Box<NumberExpr>, Box<NumberExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegerExpr {
    Literal(i64),
    Variable(IntegerVar),
    Property(ModuleId, IntegerVar),
    Negate(Box<IntegerExpr>),
    Binary(ArithOp, Box<IntegerExpr>, Box<IntegerExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberExpr {
    Literal(f64),
    Variable(NumberVar),
    Property(ModuleId, NumberVar),
    /// Integer sub-tree promoted to a number
    Widen(Box<IntegerExpr>),
    Negate(Box<NumberExpr>),
    Binary(ArithOp, Box<NumberExpr>, Box<NumberExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringExpr {
    Literal(String),
    Variable(StringVar),
    Property(ModuleId, StringVar),
}
