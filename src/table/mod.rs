//! The table/row abstraction: variables, entities, timestamps and the
//! traits concrete storage backends implement.

use crate::error::EngineResult;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub mod join;
pub mod memory;

pub use join::JoinTable;
pub use memory::MemoryTable;

/// Shared handle to a table implementation.
pub type TableRef = Arc<dyn ValueTable + Send + Sync>;

/// A named, typed column definition, optionally derived via a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value_type: ValueType,
    pub entity_type: String,
    pub repeatable: bool,
    /// Derivation expression, when this variable is computed
    pub script: Option<String>,
    /// Category/attribute metadata carried through unchanged
    pub attributes: HashMap<String, String>,
}

impl Variable {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            entity_type: entity_type.into(),
            repeatable: false,
            script: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A (type, identifier) key naming one logical row across tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableEntity {
    pub entity_type: String,
    pub identifier: String,
}

impl VariableEntity {
    #[must_use]
    pub fn new(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }
}

/// Per-row provenance record. Both fields are datetime values that may be
/// the typed null, never absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamps {
    pub created: Value,
    pub last_update: Value,
}

impl Timestamps {
    #[must_use]
    pub fn new(created: Value, last_update: Value) -> Self {
        Self {
            created,
            last_update,
        }
    }

    /// The record a source contributes when it has never seen the row.
    #[must_use]
    pub fn null() -> Self {
        Self {
            created: ValueType::DateTime.null_value(),
            last_update: ValueType::DateTime.null_value(),
        }
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::null()
    }
}

/// A named collection of rows sharing one entity type and a fixed set of
/// variables. Implemented by storage backends; this core only consumes it.
pub trait ValueTable {
    fn name(&self) -> &str;

    /// Name of the datasource this table belongs to.
    fn datasource_name(&self) -> &str;

    fn entity_type(&self) -> &str;

    fn variables(&self) -> Vec<Variable>;

    fn variable(&self, name: &str) -> Option<Variable>;

    fn entities(&self) -> HashSet<VariableEntity>;

    fn has_entity(&self, entity: &VariableEntity) -> bool;

    /// The row for `entity`. Fails with `EntityNotFound` when the entity is
    /// not in this table.
    fn value_set(&self, entity: &VariableEntity) -> EngineResult<Box<dyn ValueSet + '_>>;
}

/// The binding of one entity to one table.
pub trait ValueSet {
    fn value(&self, variable: &Variable) -> EngineResult<Value>;

    fn timestamps(&self) -> Timestamps;
}
