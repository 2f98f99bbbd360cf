//! Bindings: expressions re-evaluated every tick into a variable or property

use crate::context::EvalContext;
use crate::error::{CoreError, EvalError, TypeError};
use crate::expression::Expression;
use crate::module::{ModuleId, ModuleSet};
use crate::property::PropertyId;
use crate::types::Type;
use crate::variable::{Value, VariableId, VariableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Variable(VariableId),
    Property(ModuleId, PropertyId),
}

impl Target {
    pub fn kind(self) -> Type {
        match self {
            Target::Variable(id) => id.kind(),
            Target::Property(_, id) => id.kind(),
        }
    }

    pub fn module(self) -> Option<ModuleId> {
        match self {
            Target::Variable(_) => None,
            Target::Property(module, _) => Some(module),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    label: String,
    target: Target,
    expr: Expression,
}

impl Binding {
    /// Bind `expr` to a script variable of `ctx`
    ///
    /// `expr` may only read handles issued by `ctx`.
    pub fn variable(ctx: &EvalContext<'_>, name: &str, expr: Expression) -> Result<Self, CoreError> {
        let id = ctx.variables.resolve(name)?;
        expr.check_handles(ctx)?;
        Ok(Self::checked(name.to_string(), Target::Variable(id), expr)?)
    }

    /// Bind `expr` to `module.property`
    pub fn property(
        ctx: &EvalContext<'_>,
        module: &str,
        property: &str,
        expr: Expression,
    ) -> Result<Self, CoreError> {
        let module_id = ctx.modules.resolve(module)?;
        let id = ctx.modules.properties(module_id).resolve(property)?;
        expr.check_handles(ctx)?;
        Ok(Self::checked(
            format!("{module}.{property}"),
            Target::Property(module_id, id),
            expr,
        )?)
    }

    /// The expression type must equal the target kind, or widen into it
    fn checked(label: String, target: Target, expr: Expression) -> Result<Self, TypeError> {
        let found = expr.result_type();
        if !target.kind().accepts(found) {
            return Err(TypeError::Assignment {
                target: label,
                expected: target.kind(),
                found,
            });
        }
        Ok(Self {
            label,
            target,
            expr,
        })
    }

    /// `name` or `module.property`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    /// Current value, already in the target's kind
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        match self.target.kind() {
            Type::Number => Ok(Value::Number(self.expr.evaluate_as_number(ctx)?)),
            _ => self.expr.evaluate(ctx),
        }
    }

    /// Write a value produced by [`evaluate`](Self::evaluate) into the target
    pub fn store(
        &self,
        value: &Value,
        variables: &mut VariableStore,
        modules: &mut ModuleSet,
    ) -> Result<(), TypeError> {
        match self.target {
            Target::Variable(id) => variables.set(id, value),
            Target::Property(module, id) => modules.get_mut(module).properties_mut().set(id, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;

    #[test]
    fn test_binding_type_check() {
        let mut vars = VariableStore::new();
        vars.declare("count", Value::Integer(0)).unwrap();
        vars.declare("ratio", Value::Number(0.0)).unwrap();
        let modules = ModuleSet::new();
        let ctx = EvalContext::new(&vars, &modules);

        assert!(Binding::variable(&ctx, "count", Expression::integer(1)).is_ok());
        assert!(Binding::variable(&ctx, "ratio", Expression::integer(1)).is_ok());

        let err = Binding::variable(&ctx, "count", Expression::number(1.0)).unwrap_err();
        assert_eq!(
            err,
            CoreError::Type(TypeError::Assignment {
                target: "count".into(),
                expected: Type::Integer,
                found: Type::Number,
            })
        );

        let err = Binding::variable(&ctx, "missing", Expression::integer(1)).unwrap_err();
        assert_eq!(err, CoreError::Lookup(LookupError::UnknownVariable("missing".into())));
    }

    #[test]
    fn test_binding_rejects_handles_of_another_store() {
        let mut vars = VariableStore::new();
        vars.declare("count", Value::Integer(0)).unwrap();
        let mut other = VariableStore::new();
        let stray = other.declare("stray", Value::Integer(5)).unwrap();
        let modules = ModuleSet::new();
        let ctx = EvalContext::new(&vars, &modules);

        let expr = Expression::add(Expression::integer(1), Expression::variable(stray)).unwrap();
        let err = Binding::variable(&ctx, "count", expr).unwrap_err();
        assert_eq!(
            err,
            CoreError::Lookup(LookupError::ForeignHandle {
                kind: Type::Integer
            })
        );
    }

    #[test]
    fn test_widening_binding_evaluates_to_number() {
        let mut vars = VariableStore::new();
        let ratio = vars.declare("ratio", Value::Number(0.0)).unwrap();
        let mut modules = ModuleSet::new();

        let expr = Expression::divide(Expression::integer(7), Expression::integer(2)).unwrap();
        let ctx = EvalContext::new(&vars, &modules);
        let binding = Binding::variable(&ctx, "ratio", expr).unwrap();
        let value = binding.evaluate(&ctx).unwrap();
        assert_eq!(value, Value::Number(3.0));

        binding.store(&value, &mut vars, &mut modules).unwrap();
        assert_eq!(vars.get(ratio), Value::Number(3.0));
    }
}
