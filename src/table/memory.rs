//! A plain in-memory table backend.
//!
//! Small enough to serve as the reference backend for hosts and for this
//! crate's own tests; real deployments adapt their stores behind the same
//! traits.

use super::{Timestamps, ValueSet, ValueTable, Variable, VariableEntity};
use crate::error::{EngineError, EngineResult};
use crate::value::Value;
use std::collections::{HashMap, HashSet};

pub struct MemoryTable {
    name: String,
    datasource_name: String,
    entity_type: String,
    variables: Vec<Variable>,
    rows: HashMap<VariableEntity, MemoryRow>,
}

#[derive(Clone, Default)]
struct MemoryRow {
    values: HashMap<String, Value>,
    timestamps: Option<Timestamps>,
}

impl MemoryTable {
    #[must_use]
    pub fn new(
        datasource_name: impl Into<String>,
        name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            datasource_name: datasource_name.into(),
            entity_type: entity_type.into(),
            variables: Vec::new(),
            rows: HashMap::new(),
        }
    }

    pub fn add_variable(&mut self, variable: Variable) {
        if !self.variables.iter().any(|v| v.name == variable.name) {
            self.variables.push(variable);
        }
    }

    /// Adds an entity without any values, so it shows up in the entity set.
    pub fn add_entity(&mut self, identifier: &str) {
        let entity = VariableEntity::new(self.entity_type.clone(), identifier);
        self.rows.entry(entity).or_default();
    }

    pub fn add_value(&mut self, identifier: &str, variable: &str, value: Value) {
        let entity = VariableEntity::new(self.entity_type.clone(), identifier);
        self.rows
            .entry(entity)
            .or_default()
            .values
            .insert(variable.to_string(), value);
    }

    pub fn set_timestamps(&mut self, identifier: &str, timestamps: Timestamps) {
        let entity = VariableEntity::new(self.entity_type.clone(), identifier);
        self.rows.entry(entity).or_default().timestamps = Some(timestamps);
    }
}

impl ValueTable for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn datasource_name(&self) -> &str {
        &self.datasource_name
    }

    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn variables(&self) -> Vec<Variable> {
        self.variables.clone()
    }

    fn variable(&self, name: &str) -> Option<Variable> {
        self.variables.iter().find(|v| v.name == name).cloned()
    }

    fn entities(&self) -> HashSet<VariableEntity> {
        self.rows.keys().cloned().collect()
    }

    fn has_entity(&self, entity: &VariableEntity) -> bool {
        self.rows.contains_key(entity)
    }

    fn value_set(&self, entity: &VariableEntity) -> EngineResult<Box<dyn ValueSet + '_>> {
        let row = self.rows.get(entity).ok_or_else(|| {
            EngineError::EntityNotFound(format!(
                "{}:{} in table '{}'",
                entity.entity_type, entity.identifier, self.name
            ))
        })?;
        Ok(Box::new(MemoryValueSet { row: row.clone() }))
    }
}

struct MemoryValueSet {
    row: MemoryRow,
}

impl ValueSet for MemoryValueSet {
    fn value(&self, variable: &Variable) -> EngineResult<Value> {
        Ok(self
            .row
            .values
            .get(&variable.name)
            .cloned()
            .unwrap_or_else(|| variable.value_type.null_value()))
    }

    fn timestamps(&self) -> Timestamps {
        self.row.timestamps.clone().unwrap_or_default()
    }
}
