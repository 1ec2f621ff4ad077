//! Eager dependency validation for derived variables.
//!
//! Before any derivation script runs, the graph of variable references it
//! induces is proven acyclic. Extraction is a plain regex scan for the three
//! single-string-argument call forms (`$`, `$this`, `$var`), not a parse of
//! the expression language. Nodes hold back-references to their callers, so
//! the cycle check walks backward from each newly inserted edge.

use crate::error::{EngineError, EngineResult};
use crate::resolver::{qualified_reference, DatasourceRegistry, Reference};
use crate::table::{TableRef, ValueTable, Variable};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

static REF_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\$\(['"]([\d\w.:]*)['"]\)"#).unwrap());
static THIS_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\$this\(['"]([\d\w.:]*)['"]\)"#).unwrap());
static VAR_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\$var\(['"]([\d\w.:]*)['"]\)"#).unwrap());

/// One extracted call: which global was used and the reference it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct VariableRefCall {
    pub method: &'static str,
    pub variable_ref: String,
}

/// Scans a script for reference-bearing calls. Duplicate calls collapse.
pub(crate) fn parse_script(script: &str) -> HashSet<VariableRefCall> {
    let mut calls = HashSet::new();
    for (pattern, method) in [(&REF_CALL, "$"), (&THIS_CALL, "$this"), (&VAR_CALL, "$var")] {
        for captures in pattern.captures_iter(script) {
            if let Some(m) = captures.get(1) {
                calls.insert(VariableRefCall {
                    method,
                    variable_ref: m.as_str().to_string(),
                });
            }
        }
    }
    calls
}

struct RefNode {
    reference: String,
    table: TableRef,
    script: Option<String>,
    /// Indices of nodes whose scripts reference this one
    callers: HashSet<usize>,
    expanded: bool,
}

/// Arena of reference nodes, keyed by fully qualified reference string so
/// shared sub-dependencies collapse to one node.
#[derive(Default)]
struct RefGraph {
    nodes: Vec<RefNode>,
    index: HashMap<String, usize>,
}

impl RefGraph {
    fn intern(&mut self, reference: String, table: TableRef, script: Option<String>) -> usize {
        if let Some(&index) = self.index.get(&reference) {
            return index;
        }
        let index = self.nodes.len();
        self.index.insert(reference.clone(), index);
        self.nodes.push(RefNode {
            reference,
            table,
            script,
            callers: HashSet::new(),
            expanded: false,
        });
        index
    }

    /// Records that `caller`'s script references `callee`, then proves the
    /// new edge closed no cycle.
    fn add_edge(&mut self, callee: usize, caller: usize) -> EngineResult<()> {
        self.nodes[callee].callers.insert(caller);
        self.check_cycle(callee)
    }

    /// Walks the caller-set transitively from `start`; a cycle exists iff
    /// `start` itself becomes reachable again. The visited set is scoped to
    /// this one check, so diamonds (two paths to a shared caller) pass.
    fn check_cycle(&self, start: usize) -> EngineResult<()> {
        let mut visited = HashSet::new();
        let mut stack: Vec<usize> = self.nodes[start].callers.iter().copied().collect();
        while let Some(node) = stack.pop() {
            if node == start {
                return Err(EngineError::CircularVariableDependency(
                    self.nodes[start].reference.clone(),
                ));
            }
            if visited.insert(node) {
                stack.extend(self.nodes[node].callers.iter().copied());
            }
        }
        Ok(())
    }
}

/// Proves that `variable`'s derivation (and everything it transitively
/// references) is acyclic. Resolution failures abort the validation.
pub fn validate(
    variable: &Variable,
    table: &TableRef,
    registry: &DatasourceRegistry,
) -> EngineResult<()> {
    let started = Instant::now();
    let mut graph = RefGraph::default();
    let root = graph.intern(
        qualified_reference(table.as_ref(), &variable.name),
        table.clone(),
        variable.script.clone(),
    );
    graph.nodes[root].expanded = true;
    expand(&mut graph, root, registry)?;
    trace!(
        "script validation of {} in {:?}",
        variable.name,
        started.elapsed()
    );
    Ok(())
}

/// Validates every derived variable of a table in one pass.
pub fn validate_table(table: &TableRef, registry: &DatasourceRegistry) -> EngineResult<()> {
    for variable in table.variables() {
        if variable.script.is_some() {
            validate(&variable, table, registry)?;
        }
    }
    Ok(())
}

fn expand(graph: &mut RefGraph, caller: usize, registry: &DatasourceRegistry) -> EngineResult<()> {
    let script = match graph.nodes[caller].script.clone() {
        Some(script) => script,
        None => {
            trace!("{} has no script", graph.nodes[caller].reference);
            return Ok(());
        }
    };
    let caller_table = graph.nodes[caller].table.clone();
    for call in parse_script(&script) {
        let reference = Reference::parse(&call.variable_ref)?;
        let resolved = match call.method {
            // `$this`/`$var` always name a variable on the calling table.
            "$this" | "$var" => registry.resolve(
                &Reference {
                    datasource: None,
                    table: None,
                    variable: reference.variable.clone(),
                },
                &caller_table,
            )?,
            _ => registry.resolve(&reference, &caller_table)?,
        };
        let callee = graph.intern(
            qualified_reference(resolved.table.as_ref(), &resolved.variable.name),
            resolved.table,
            resolved.variable.script,
        );
        graph.add_edge(callee, caller)?;
        if !graph.nodes[callee].expanded {
            graph.nodes[callee].expanded = true;
            expand(graph, callee, registry)?;
        }
    }
    Ok(())
}
