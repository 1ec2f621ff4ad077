//! The evaluation context: an explicit, passed-down scope stack.
//!
//! One context instance serves one evaluation at a time; nested evaluation
//! (a script triggering another derived variable) pushes a nested scope.
//! Scopes are popped by a drop guard, so the pop happens on every exit path
//! including failures.

use crate::error::{EngineError, EngineResult};
use crate::table::{TableRef, VariableEntity};
use std::cell::RefCell;

/// The (table, entity) pair a script evaluates against.
#[derive(Clone)]
pub struct Scope {
    pub table: TableRef,
    pub entity: VariableEntity,
}

/// Scope stack confined to a single evaluation thread (`RefCell` on
/// purpose: the context is not reentrant across threads).
#[derive(Default)]
pub struct EvaluationContext {
    scopes: RefCell<Vec<Scope>>,
}

impl EvaluationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a scope; the returned guard pops it when dropped.
    pub fn enter(&self, table: TableRef, entity: VariableEntity) -> ScopeGuard<'_> {
        self.scopes.borrow_mut().push(Scope { table, entity });
        ScopeGuard { context: self }
    }

    /// The innermost scope.
    pub fn current(&self) -> EngineResult<Scope> {
        self.scopes
            .borrow()
            .last()
            .cloned()
            .ok_or_else(|| EngineError::InvalidData("no evaluation scope".to_string()))
    }

    pub fn depth(&self) -> usize {
        self.scopes.borrow().len()
    }
}

pub struct ScopeGuard<'a> {
    context: &'a EvaluationContext,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.context.scopes.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineResult;
    use crate::table::MemoryTable;
    use std::sync::Arc;

    fn table() -> TableRef {
        Arc::new(MemoryTable::new("ds", "t", "participant"))
    }

    #[test]
    fn scopes_nest_and_pop() {
        let context = EvaluationContext::new();
        assert!(context.current().is_err());
        {
            let _outer = context.enter(table(), VariableEntity::new("participant", "1"));
            assert_eq!(context.depth(), 1);
            {
                let _inner = context.enter(table(), VariableEntity::new("participant", "2"));
                assert_eq!(context.depth(), 2);
                assert_eq!(context.current().unwrap().entity.identifier, "2");
            }
            assert_eq!(context.depth(), 1);
            assert_eq!(context.current().unwrap().entity.identifier, "1");
        }
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn scope_pops_on_error_path() {
        let context = EvaluationContext::new();
        fn failing(context: &EvaluationContext) -> EngineResult<()> {
            let _guard = context.enter(
                Arc::new(MemoryTable::new("ds", "t", "participant")),
                VariableEntity::new("participant", "1"),
            );
            Err(crate::error::EngineError::InvalidData("boom".to_string()))
        }
        assert!(failing(&context).is_err());
        assert_eq!(context.depth(), 0);
    }
}
