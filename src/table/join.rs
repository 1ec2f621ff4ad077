//! The join engine: several physical tables over one entity type presented
//! as a single logical table.

use super::{TableRef, Timestamps, ValueSet, ValueTable, Variable, VariableEntity};
use crate::error::{EngineError, EngineResult};
use crate::value::{Value, ValueType};
use log::debug;
use std::collections::{HashMap, HashSet};

/// A logical table composed of several physical tables.
///
/// The entity set is the union of the constituent entity sets; a variable is
/// always fetched from the single constituent that owns it. Table order only
/// matters as a tie-break: when two constituents declare the same variable
/// name, the first one wins.
pub struct JoinTable {
    name: String,
    datasource_name: String,
    entity_type: String,
    tables: Vec<TableRef>,
    /// variable name -> index of the owning constituent, built once
    owners: HashMap<String, usize>,
}

impl JoinTable {
    pub fn new(tables: Vec<TableRef>) -> EngineResult<Self> {
        let first = tables.first().ok_or_else(|| {
            EngineError::InvalidData("a join requires at least one table".to_string())
        })?;
        let entity_type = first.entity_type().to_string();
        let datasource_name = first.datasource_name().to_string();
        for table in &tables {
            if table.entity_type() != entity_type {
                return Err(EngineError::InvalidData(format!(
                    "cannot join table '{}' of entity type '{}' with entity type '{}'",
                    table.name(),
                    table.entity_type(),
                    entity_type
                )));
            }
        }
        let mut owners = HashMap::new();
        for (index, table) in tables.iter().enumerate() {
            for variable in table.variables() {
                owners.entry(variable.name).or_insert(index);
            }
        }
        let name = tables
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join("-");
        debug!(
            "joined {} tables over entity type '{}' as '{}'",
            tables.len(),
            entity_type,
            name
        );
        Ok(Self {
            name,
            datasource_name,
            entity_type,
            tables,
            owners,
        })
    }

    /// The value of `variable` for `entity`, fetched from the owning
    /// constituent. An entity absent from that source yields the variable
    /// type's null value.
    pub fn get(&self, entity: &VariableEntity, variable: &Variable) -> EngineResult<Value> {
        let index = self.owner_index(&variable.name)?;
        let owner = &self.tables[index];
        if !owner.has_entity(entity) {
            return Ok(variable.value_type.null_value());
        }
        owner.value_set(entity)?.value(variable)
    }

    fn owner_index(&self, variable_name: &str) -> EngineResult<usize> {
        self.owners.get(variable_name).copied().ok_or_else(|| {
            EngineError::Resolution(format!(
                "no variable '{}' in join table '{}'",
                variable_name, self.name
            ))
        })
    }
}

impl ValueTable for JoinTable {
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
        let mut variables = Vec::new();
        for (index, table) in self.tables.iter().enumerate() {
            for variable in table.variables() {
                if self.owners.get(&variable.name) == Some(&index) {
                    variables.push(variable);
                }
            }
        }
        variables
    }

    fn variable(&self, name: &str) -> Option<Variable> {
        let index = *self.owners.get(name)?;
        self.tables[index].variable(name)
    }

    fn entities(&self) -> HashSet<VariableEntity> {
        let mut all = HashSet::new();
        for table in &self.tables {
            all.extend(table.entities());
        }
        all
    }

    fn has_entity(&self, entity: &VariableEntity) -> bool {
        self.tables.iter().any(|t| t.has_entity(entity))
    }

    fn value_set(&self, entity: &VariableEntity) -> EngineResult<Box<dyn ValueSet + '_>> {
        let mut inner = Vec::with_capacity(self.tables.len());
        let mut present = false;
        for table in &self.tables {
            if table.has_entity(entity) {
                inner.push(Some(table.value_set(entity)?));
                present = true;
            } else {
                inner.push(None);
            }
        }
        if !present {
            return Err(EngineError::EntityNotFound(format!(
                "{}:{}",
                entity.entity_type, entity.identifier
            )));
        }
        Ok(Box::new(JoinedValueSet { table: self, inner }))
    }
}

/// The composite row of a join: one inner row per constituent that knows the
/// entity, `None` for sources the entity is absent from.
pub struct JoinedValueSet<'a> {
    table: &'a JoinTable,
    inner: Vec<Option<Box<dyn ValueSet + 'a>>>,
}

impl ValueSet for JoinedValueSet<'_> {
    fn value(&self, variable: &Variable) -> EngineResult<Value> {
        let index = self.table.owner_index(&variable.name)?;
        match &self.inner[index] {
            Some(value_set) => value_set.value(variable),
            None => Ok(variable.value_type.null_value()),
        }
    }

    fn timestamps(&self) -> Timestamps {
        let all: Vec<Timestamps> = self
            .inner
            .iter()
            .map(|row| row.as_ref().map_or_else(Timestamps::null, |vs| vs.timestamps()))
            .collect();
        Timestamps::new(
            reconcile(all.iter().map(|t| &t.created), true),
            reconcile(all.iter().map(|t| &t.last_update), false),
        )
    }
}

/// Sorts the non-null timestamp values and keeps the earliest or the latest.
/// All-null input yields the datetime typed null, never an absent value.
///
/// The asymmetry is deliberate: a logical row was first created whenever any
/// source first saw it, and last touched whenever any source most recently
/// touched it.
fn reconcile<'a>(values: impl Iterator<Item = &'a Value>, earliest: bool) -> Value {
    let mut non_null: Vec<&Value> = values.filter(|v| !v.is_null()).collect();
    if non_null.is_empty() {
        return ValueType::DateTime.null_value();
    }
    non_null.sort_by(|a, b| a.compare(b));
    let pick = if earliest { 0 } else { non_null.len() - 1 };
    non_null[pick].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(text: &str) -> Value {
        ValueType::DateTime.parse(text).unwrap()
    }

    #[test]
    fn reconcile_picks_earliest_and_latest() {
        let values = [dt("2020-03-01T00:00:00Z"), dt("2020-01-01T00:00:00Z"), dt("2020-02-01T00:00:00Z")];
        assert_eq!(reconcile(values.iter(), true), dt("2020-01-01T00:00:00Z"));
        assert_eq!(reconcile(values.iter(), false), dt("2020-03-01T00:00:00Z"));
    }

    #[test]
    fn reconcile_skips_nulls() {
        let values = [
            ValueType::DateTime.null_value(),
            dt("2020-02-01T00:00:00Z"),
            ValueType::DateTime.null_value(),
        ];
        assert_eq!(reconcile(values.iter(), true), dt("2020-02-01T00:00:00Z"));
        assert_eq!(reconcile(values.iter(), false), dt("2020-02-01T00:00:00Z"));
    }

    #[test]
    fn reconcile_all_null_is_typed_null() {
        let values = [ValueType::DateTime.null_value(), ValueType::DateTime.null_value()];
        let result = reconcile(values.iter(), true);
        assert!(result.is_null());
        assert_eq!(result.value_type(), ValueType::DateTime);
    }
}
