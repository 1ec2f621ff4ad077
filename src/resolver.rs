//! Variable reference parsing and resolution.
//!
//! Reference grammar: `([datasourceName "."] tableName ":")? variableName`.
//! A bare name resolves against the table currently in evaluation scope; a
//! `table:variable` form against that table's datasource; a fully qualified
//! form against the registry.

use crate::error::{EngineError, EngineResult};
use crate::table::{TableRef, ValueTable, Variable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Parsed form of a variable reference string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub datasource: Option<String>,
    pub table: Option<String>,
    pub variable: String,
}

impl Reference {
    pub fn parse(input: &str) -> EngineResult<Self> {
        let malformed =
            || EngineError::InvalidData(format!("malformed variable reference '{}'", input));
        match input.split_once(':') {
            None => {
                if input.is_empty() {
                    return Err(malformed());
                }
                Ok(Self {
                    datasource: None,
                    table: None,
                    variable: input.to_string(),
                })
            }
            Some((qualifier, variable)) => {
                if variable.is_empty() || qualifier.is_empty() {
                    return Err(malformed());
                }
                let (datasource, table) = match qualifier.split_once('.') {
                    None => (None, qualifier),
                    Some((ds, table)) => {
                        if ds.is_empty() || table.is_empty() {
                            return Err(malformed());
                        }
                        (Some(ds.to_string()), table)
                    }
                };
                Ok(Self {
                    datasource,
                    table: Some(table.to_string()),
                    variable: variable.to_string(),
                })
            }
        }
    }
}

impl FromStr for Reference {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            if let Some(ds) = &self.datasource {
                write!(f, "{}.", ds)?;
            }
            write!(f, "{}:", table)?;
        }
        f.write_str(&self.variable)
    }
}

/// Fully qualified `datasource.table:variable` form for a variable on a
/// table. This is the identity dependency-graph nodes are keyed by.
pub fn qualified_reference(table: &dyn ValueTable, variable: &str) -> String {
    format!(
        "{}.{}:{}",
        table.datasource_name(),
        table.name(),
        variable
    )
}

/// A named set of tables.
pub struct Datasource {
    name: String,
    tables: HashMap<String, TableRef>,
}

impl Datasource {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_table(&mut self, table: TableRef) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn table(&self, name: &str) -> EngineResult<TableRef> {
        self.tables.get(name).cloned().ok_or_else(|| {
            EngineError::Resolution(format!(
                "no table '{}' in datasource '{}'",
                name, self.name
            ))
        })
    }
}

/// A resolved reference: the owning table and the variable definition.
pub struct ResolvedVariable {
    pub table: TableRef,
    pub variable: Variable,
}

/// Registry of datasources used to resolve qualified references.
#[derive(Default)]
pub struct DatasourceRegistry {
    datasources: HashMap<String, Datasource>,
}

impl DatasourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_datasource(&mut self, datasource: Datasource) {
        self.datasources.insert(datasource.name.clone(), datasource);
    }

    pub fn datasource(&self, name: &str) -> EngineResult<&Datasource> {
        self.datasources
            .get(name)
            .ok_or_else(|| EngineError::Resolution(format!("no datasource '{}'", name)))
    }

    pub fn table(&self, datasource: &str, table: &str) -> EngineResult<TableRef> {
        self.datasource(datasource)?.table(table)
    }

    /// Resolves a reference against the registry, with `context` supplying
    /// the table (and datasource) for unqualified forms. Failures name the
    /// unresolved token and always propagate.
    pub fn resolve(
        &self,
        reference: &Reference,
        context: &TableRef,
    ) -> EngineResult<ResolvedVariable> {
        let table = match (&reference.datasource, &reference.table) {
            (Some(ds), Some(table)) => self.table(ds, table)?,
            (None, Some(table)) => {
                if table == context.name() {
                    context.clone()
                } else {
                    self.table(context.datasource_name(), table)?
                }
            }
            (None, None) => context.clone(),
            (Some(_), None) => {
                return Err(EngineError::InvalidData(format!(
                    "malformed variable reference '{}'",
                    reference
                )))
            }
        };
        let variable = table.variable(&reference.variable).ok_or_else(|| {
            EngineError::Resolution(format!(
                "no variable '{}' in table '{}.{}'",
                reference.variable,
                table.datasource_name(),
                table.name()
            ))
        })?;
        Ok(ResolvedVariable { table, variable })
    }
}
