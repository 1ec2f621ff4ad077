//! # tablefold
//!
//! A data-virtualization core: heterogeneous tabular sources behind a
//! uniform table/row model, with derived columns computed by an embedded
//! script language that may reference columns in other, joined tables.
//!
//! The crate is built around three tightly coupled pieces:
//!
//! 1. The **join engine** ([`table::JoinTable`]) composes several physical
//!    tables into one logical table and reconciles per-row timestamps
//!    (earliest `created`, latest `last_update`).
//! 2. The **dependency validator** ([`script::validate`]) proves, before any
//!    derivation script runs, that no derived variable depends on itself
//!    transitively.
//! 3. The **typed value system** ([`value::Value`], [`value::ValueType`])
//!    with distinguished typed nulls, sequences and a closed coercion table.
//!
//! Storage backends implement [`table::ValueTable`]/[`table::ValueSet`];
//! the expression evaluator is likewise external and interacts through the
//! globals in [`script::globals`] and the [`script::EvaluationContext`].

pub mod error;
pub mod resolver;
pub mod script;
pub mod table;
pub mod value;

pub use error::{EngineError, EngineResult};
pub use resolver::{qualified_reference, Datasource, DatasourceRegistry, Reference, ResolvedVariable};
pub use script::{validate, validate_table, EvaluationContext, ScriptArg};
pub use table::{
    JoinTable, MemoryTable, TableRef, Timestamps, ValueSet, ValueTable, Variable, VariableEntity,
};
pub use value::{Literal, Value, ValueContent, ValueType};
