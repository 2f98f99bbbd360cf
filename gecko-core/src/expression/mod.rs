//! Expression trees
//!
//! An [`Expression`] is built bottom-up through checked constructors; a tree
//! that exists is well typed and its [`result_type`](Expression::result_type)
//! never changes. Evaluation reads variables and module properties through an
//! [`EvalContext`].
//!
//! ```
//! use gecko_core::{EvalContext, Expression, ModuleSet, VariableStore, Value};
//!
//! let mut vars = VariableStore::new();
//! let speed = vars.declare("speed", Value::Integer(3)).unwrap();
//! let modules = ModuleSet::new();
//!
//! let expr = Expression::multiply(Expression::variable(speed), Expression::number(1.5)).unwrap();
//! let ctx = EvalContext::new(&vars, &modules);
//! assert_eq!(expr.evaluate_as_number(&ctx).unwrap(), 4.5);
//! ```

mod check;
mod eval;
mod node;

pub use node::{ArithOp, BooleanExpr, CompareOp, IntegerExpr, NumberExpr, StringExpr};

use crate::context::EvalContext;
use crate::error::{EvalError, LookupError, TypeError};
use crate::module::ModuleSet;
use crate::types::{check_comparison_types, check_logical_types, common_numeric_type, Type};
use crate::variable::{Value, VariableId};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Boolean(BooleanExpr),
    Integer(IntegerExpr),
    Number(NumberExpr),
    String(StringExpr),
}

impl From<BooleanExpr> for Expression {
    fn from(expr: BooleanExpr) -> Self {
        Expression::Boolean(expr)
    }
}

impl From<IntegerExpr> for Expression {
    fn from(expr: IntegerExpr) -> Self {
        Expression::Integer(expr)
    }
}

impl From<NumberExpr> for Expression {
    fn from(expr: NumberExpr) -> Self {
        Expression::Number(expr)
    }
}

impl From<StringExpr> for Expression {
    fn from(expr: StringExpr) -> Self {
        Expression::String(expr)
    }
}

// ==================== construction ====================

impl Expression {
    pub fn boolean(value: bool) -> Self {
        BooleanExpr::Literal(value).into()
    }

    pub fn integer(value: i64) -> Self {
        IntegerExpr::Literal(value).into()
    }

    pub fn number(value: f64) -> Self {
        NumberExpr::Literal(value).into()
    }

    pub fn string(value: impl Into<String>) -> Self {
        StringExpr::Literal(value.into()).into()
    }

    /// Reference to a variable; takes the variable's kind
    pub fn variable(id: VariableId) -> Self {
        match id {
            VariableId::Boolean(v) => BooleanExpr::Variable(v).into(),
            VariableId::Integer(v) => IntegerExpr::Variable(v).into(),
            VariableId::Number(v) => NumberExpr::Variable(v).into(),
            VariableId::String(v) => StringExpr::Variable(v).into(),
        }
    }

    /// Live reference to `module.property`, resolved now.
    ///
    /// The expression takes the property's own kind.
    pub fn property(modules: &ModuleSet, module: &str, property: &str) -> Result<Self, LookupError> {
        let module_id = modules.resolve(module)?;
        let expr = match modules.properties(module_id).resolve(property)?.cell() {
            VariableId::Boolean(v) => BooleanExpr::Property(module_id, v).into(),
            VariableId::Integer(v) => IntegerExpr::Property(module_id, v).into(),
            VariableId::Number(v) => NumberExpr::Property(module_id, v).into(),
            VariableId::String(v) => StringExpr::Property(module_id, v).into(),
        };
        Ok(expr)
    }

    pub fn negate(operand: Expression) -> Result<Self, TypeError> {
        let ty = operand.result_type();
        common_numeric_type(ty, ty)?;
        match operand {
            Expression::Integer(e) => Ok(IntegerExpr::Negate(Box::new(e)).into()),
            Expression::Number(e) => Ok(NumberExpr::Negate(Box::new(e)).into()),
            _ => Err(TypeError::Arithmetic { left: ty, right: ty }),
        }
    }

    pub fn logical_not(operand: Expression) -> Result<Self, TypeError> {
        let ty = operand.result_type();
        check_logical_types(ty, ty)?;
        match operand {
            Expression::Boolean(e) => Ok(BooleanExpr::Not(Box::new(e)).into()),
            _ => Err(TypeError::Logical { left: ty, right: ty }),
        }
    }

    /// Integer arithmetic when both sides are integers, number arithmetic when
    /// both are numbery.
    pub fn arithmetic(op: ArithOp, left: Expression, right: Expression) -> Result<Self, TypeError> {
        let (lt, rt) = (left.result_type(), right.result_type());
        let mismatch = TypeError::Arithmetic { left: lt, right: rt };
        match common_numeric_type(lt, rt)? {
            Type::Integer => match (left, right) {
                (Expression::Integer(l), Expression::Integer(r)) => {
                    Ok(IntegerExpr::Binary(op, Box::new(l), Box::new(r)).into())
                }
                _ => Err(mismatch),
            },
            _ => {
                let l = left.into_number().ok_or_else(|| mismatch.clone())?;
                let r = right.into_number().ok_or(mismatch)?;
                Ok(NumberExpr::Binary(op, Box::new(l), Box::new(r)).into())
            }
        }
    }

    pub fn power(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::arithmetic(ArithOp::Power, left, right)
    }

    pub fn multiply(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::arithmetic(ArithOp::Multiply, left, right)
    }

    pub fn divide(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::arithmetic(ArithOp::Divide, left, right)
    }

    pub fn add(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::arithmetic(ArithOp::Add, left, right)
    }

    pub fn subtract(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::arithmetic(ArithOp::Subtract, left, right)
    }

    pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Result<Self, TypeError> {
        let (lt, rt) = (left.result_type(), right.result_type());
        check_comparison_types(lt, rt)?;
        let mismatch = TypeError::Comparison { left: lt, right: rt };
        let l = left.into_number().ok_or_else(|| mismatch.clone())?;
        let r = right.into_number().ok_or(mismatch)?;
        Ok(BooleanExpr::Compare(op, Box::new(l), Box::new(r)).into())
    }

    pub fn greater(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::compare(CompareOp::Greater, left, right)
    }

    pub fn less(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::compare(CompareOp::Less, left, right)
    }

    pub fn greater_equal(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::compare(CompareOp::GreaterEqual, left, right)
    }

    pub fn less_equal(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::compare(CompareOp::LessEqual, left, right)
    }

    pub fn equal(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::compare(CompareOp::Equal, left, right)
    }

    pub fn not_equal(left: Expression, right: Expression) -> Result<Self, TypeError> {
        Self::compare(CompareOp::NotEqual, left, right)
    }

    pub fn and(left: Expression, right: Expression) -> Result<Self, TypeError> {
        let (l, r) = Self::boolean_operands(left, right)?;
        Ok(BooleanExpr::And(Box::new(l), Box::new(r)).into())
    }

    pub fn or(left: Expression, right: Expression) -> Result<Self, TypeError> {
        let (l, r) = Self::boolean_operands(left, right)?;
        Ok(BooleanExpr::Or(Box::new(l), Box::new(r)).into())
    }

    fn boolean_operands(
        left: Expression,
        right: Expression,
    ) -> Result<(BooleanExpr, BooleanExpr), TypeError> {
        let (lt, rt) = (left.result_type(), right.result_type());
        check_logical_types(lt, rt)?;
        match (left, right) {
            (Expression::Boolean(l), Expression::Boolean(r)) => Ok((l, r)),
            _ => Err(TypeError::Logical { left: lt, right: rt }),
        }
    }

    /// Numeric view of this tree, widening integers; `None` for booleans and
    /// strings
    pub fn into_number(self) -> Option<NumberExpr> {
        match self {
            Expression::Integer(e) => Some(NumberExpr::Widen(Box::new(e))),
            Expression::Number(e) => Some(e),
            _ => None,
        }
    }

    pub fn result_type(&self) -> Type {
        match self {
            Expression::Boolean(_) => Type::Boolean,
            Expression::Integer(_) => Type::Integer,
            Expression::Number(_) => Type::Number,
            Expression::String(_) => Type::String,
        }
    }
}

// ==================== evaluation ====================

impl Expression {
    fn invalid(&self, requested: Type) -> EvalError {
        EvalError::InvalidOperation {
            requested,
            actual: self.result_type(),
        }
    }

    pub fn evaluate_as_boolean(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        match self {
            Expression::Boolean(e) => e.evaluate(ctx),
            _ => Err(self.invalid(Type::Boolean)),
        }
    }

    pub fn evaluate_as_integer(&self, ctx: &EvalContext<'_>) -> Result<i64, EvalError> {
        match self {
            Expression::Integer(e) => e.evaluate(ctx),
            _ => Err(self.invalid(Type::Integer)),
        }
    }

    /// Legal for number and integer trees; integers are computed as integers
    /// and widened at the end
    pub fn evaluate_as_number(&self, ctx: &EvalContext<'_>) -> Result<f64, EvalError> {
        match self {
            Expression::Number(e) => e.evaluate(ctx),
            Expression::Integer(e) => Ok(e.evaluate(ctx)? as f64),
            _ => Err(self.invalid(Type::Number)),
        }
    }

    pub fn evaluate_as_string<'a>(&'a self, ctx: &EvalContext<'a>) -> Result<&'a str, EvalError> {
        match self {
            Expression::String(e) => Ok(e.evaluate(ctx)),
            _ => Err(self.invalid(Type::String)),
        }
    }

    /// Evaluate through the entry point matching the result type
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        Ok(match self {
            Expression::Boolean(e) => Value::Boolean(e.evaluate(ctx)?),
            Expression::Integer(e) => Value::Integer(e.evaluate(ctx)?),
            Expression::Number(e) => Value::Number(e.evaluate(ctx)?),
            Expression::String(e) => Value::String(e.evaluate(ctx).to_string()),
        })
    }
}
