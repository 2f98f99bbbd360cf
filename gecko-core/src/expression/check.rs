//! Handle validation
//!
//! The evaluator indexes stores directly. A tree is walked once here, before
//! it is bound or called with, so a handle issued by some other store is a
//! [`LookupError`] instead of a panic inside the tick loop.

use super::node::{BooleanExpr, IntegerExpr, NumberExpr, StringExpr};
use super::Expression;
use crate::context::EvalContext;
use crate::error::LookupError;
use crate::module::ModuleId;
use crate::variable::VariableId;

fn check_property(
    ctx: &EvalContext<'_>,
    module: ModuleId,
    cell: VariableId,
) -> Result<(), LookupError> {
    if module.index() >= ctx.modules.len() {
        return Err(LookupError::ForeignHandle { kind: cell.kind() });
    }
    ctx.modules.properties(module).check(cell)
}

impl Expression {
    /// Every variable and property the tree reads belongs to `ctx`
    pub fn check_handles(&self, ctx: &EvalContext<'_>) -> Result<(), LookupError> {
        match self {
            Expression::Boolean(e) => e.check_handles(ctx),
            Expression::Integer(e) => e.check_handles(ctx),
            Expression::Number(e) => e.check_handles(ctx),
            Expression::String(e) => e.check_handles(ctx),
        }
    }
}

impl BooleanExpr {
    fn check_handles(&self, ctx: &EvalContext<'_>) -> Result<(), LookupError> {
        match self {
            BooleanExpr::Literal(_) => Ok(()),
            BooleanExpr::Variable(v) => ctx.variables.check(VariableId::Boolean(*v)),
            BooleanExpr::Property(m, v) => check_property(ctx, *m, VariableId::Boolean(*v)),
            BooleanExpr::Not(operand) => operand.check_handles(ctx),
            BooleanExpr::And(left, right) | BooleanExpr::Or(left, right) => {
                left.check_handles(ctx)?;
                right.check_handles(ctx)
            }
            BooleanExpr::Compare(_, left, right) => {
                left.check_handles(ctx)?;
                right.check_handles(ctx)
            }
        }
    }
}

impl IntegerExpr {
    fn check_handles(&self, ctx: &EvalContext<'_>) -> Result<(), LookupError> {
        match self {
            IntegerExpr::Literal(_) => Ok(()),
            IntegerExpr::Variable(v) => ctx.variables.check(VariableId::Integer(*v)),
            IntegerExpr::Property(m, v) => check_property(ctx, *m, VariableId::Integer(*v)),
            IntegerExpr::Negate(operand) => operand.check_handles(ctx),
            IntegerExpr::Binary(_, left, right) => {
                left.check_handles(ctx)?;
                right.check_handles(ctx)
            }
        }
    }
}

impl NumberExpr {
    fn check_handles(&self, ctx: &EvalContext<'_>) -> Result<(), LookupError> {
        match self {
            NumberExpr::Literal(_) => Ok(()),
            NumberExpr::Variable(v) => ctx.variables.check(VariableId::Number(*v)),
            NumberExpr::Property(m, v) => check_property(ctx, *m, VariableId::Number(*v)),
            NumberExpr::Widen(inner) => inner.check_handles(ctx),
            NumberExpr::Negate(operand) => operand.check_handles(ctx),
            NumberExpr::Binary(_, left, right) => {
                left.check_handles(ctx)?;
                right.check_handles(ctx)
            }
        }
    }
}

impl StringExpr {
    fn check_handles(&self, ctx: &EvalContext<'_>) -> Result<(), LookupError> {
        match self {
            StringExpr::Literal(_) => Ok(()),
            StringExpr::Variable(v) => ctx.variables.check(VariableId::String(*v)),
            StringExpr::Property(m, v) => check_property(ctx, *m, VariableId::String(*v)),
        }
    }
}
