use crate::module::ModuleSet;
use crate::variable::VariableStore;

/// Everything an expression may read while it is evaluated
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub variables: &'a VariableStore,
    pub modules: &'a ModuleSet,
}

impl<'a> EvalContext<'a> {
    pub fn new(variables: &'a VariableStore, modules: &'a ModuleSet) -> Self {
        Self { variables, modules }
    }
}
