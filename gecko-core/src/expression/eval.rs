//! Tree-walking evaluator
//!
//! Numeric evaluation never allocates. Variables and properties are read at
//! the moment the node is visited.

use super::node::{ArithOp, BooleanExpr, IntegerExpr, NumberExpr, StringExpr};
use crate::context::EvalContext;
use crate::error::EvalError;

impl BooleanExpr {
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        match self {
            BooleanExpr::Literal(b) => Ok(*b),
            BooleanExpr::Variable(v) => Ok(ctx.variables.boolean(*v)),
            BooleanExpr::Property(module, v) => Ok(ctx.modules.properties(*module).boolean(*v)),
            BooleanExpr::Not(operand) => Ok(!operand.evaluate(ctx)?),
            BooleanExpr::And(left, right) => Ok(left.evaluate(ctx)? && right.evaluate(ctx)?),
            BooleanExpr::Or(left, right) => Ok(left.evaluate(ctx)? || right.evaluate(ctx)?),
            BooleanExpr::Compare(op, left, right) => {
                Ok(op.apply(left.evaluate(ctx)?, right.evaluate(ctx)?))
            }
        }
    }
}

impl IntegerExpr {
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<i64, EvalError> {
        match self {
            IntegerExpr::Literal(i) => Ok(*i),
            IntegerExpr::Variable(v) => Ok(ctx.variables.integer(*v)),
            IntegerExpr::Property(module, v) => Ok(ctx.modules.properties(*module).integer(*v)),
            IntegerExpr::Negate(operand) => Ok(operand.evaluate(ctx)?.wrapping_neg()),
            IntegerExpr::Binary(op, left, right) => {
                integer_arith(*op, left.evaluate(ctx)?, right.evaluate(ctx)?)
            }
        }
    }
}

impl NumberExpr {
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<f64, EvalError> {
        match self {
            NumberExpr::Literal(n) => Ok(*n),
            NumberExpr::Variable(v) => Ok(ctx.variables.number(*v)),
            NumberExpr::Property(module, v) => Ok(ctx.modules.properties(*module).number(*v)),
            NumberExpr::Widen(inner) => Ok(inner.evaluate(ctx)? as f64),
            NumberExpr::Negate(operand) => Ok(-operand.evaluate(ctx)?),
            NumberExpr::Binary(op, left, right) => {
                Ok(number_arith(*op, left.evaluate(ctx)?, right.evaluate(ctx)?))
            }
        }
    }
}

impl StringExpr {
    /// Borrowed from the tree or from the variable that holds it
    pub fn evaluate<'a>(&'a self, ctx: &EvalContext<'a>) -> &'a str {
        match self {
            StringExpr::Literal(s) => s,
            StringExpr::Variable(v) => ctx.variables.string(*v),
            StringExpr::Property(module, v) => ctx.modules.properties(*module).string(*v),
        }
    }
}

/// Two's complement arithmetic; overflow wraps
pub(crate) fn integer_arith(op: ArithOp, left: i64, right: i64) -> Result<i64, EvalError> {
    match op {
        ArithOp::Add => Ok(left.wrapping_add(right)),
        ArithOp::Subtract => Ok(left.wrapping_sub(right)),
        ArithOp::Multiply => Ok(left.wrapping_mul(right)),
        ArithOp::Divide => {
            if right == 0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(left.wrapping_div(right))
            }
        }
        ArithOp::Power => integer_pow(left, right),
    }
}

pub(crate) fn number_arith(op: ArithOp, left: f64, right: f64) -> f64 {
    match op {
        ArithOp::Add => left + right,
        ArithOp::Subtract => left - right,
        ArithOp::Multiply => left * right,
        ArithOp::Divide => left / right,
        ArithOp::Power => left.powf(right),
    }
}

/// Exact integer power. Negative exponents truncate the real result toward
/// zero, so only `1` and `-1` survive them.
fn integer_pow(base: i64, exponent: i64) -> Result<i64, EvalError> {
    if exponent >= 0 {
        return Ok(wrapping_pow(base, exponent.unsigned_abs()));
    }
    match base {
        0 => Err(EvalError::DivisionByZero),
        1 => Ok(1),
        -1 if exponent % 2 == 0 => Ok(1),
        -1 => Ok(-1),
        _ => Ok(0),
    }
}

fn wrapping_pow(mut base: i64, mut exponent: u64) -> i64 {
    let mut acc: i64 = 1;
    while exponent > 0 {
        if exponent & 1 == 1 {
            acc = acc.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exponent >>= 1;
    }
    acc
}
