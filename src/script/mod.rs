//! The script-boundary surface: evaluation scopes, dependency validation
//! and the engine-facing globals. The expression grammar and evaluator
//! themselves are external collaborators.

pub mod context;
pub mod globals;
pub mod validator;

pub use context::{EvaluationContext, Scope, ScopeGuard};
pub use globals::{join, new_sequence, new_value, set_of, ScriptArg};
pub use validator::{validate, validate_table};
