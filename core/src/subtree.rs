//! Child operators of a transitive path: the base-edge relation and the
//! subtrees bound to its sides.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::ids::{IdTable, VariableColumns};

/// A node of the query tree whose result a transitive path consumes.
///
/// # Contract
///
/// - `result()` returns the same table on every call for unchanged inputs.
/// - `variable_columns()` and `result_width()` describe that table and are
///   fixed at construction.
/// - Estimates are planner hints only; nothing depends on their accuracy.
pub trait Subtree: Send + Sync + fmt::Debug {
    /// Materialize (or hand out the cached) result.
    fn result(&self, ctx: &ExecutionContext) -> Result<Arc<IdTable>>;

    fn result_width(&self) -> usize;

    fn variable_columns(&self) -> VariableColumns;

    /// Estimated number of result rows.
    fn size_estimate(&self) -> u64;

    fn cost_estimate(&self) -> u64;

    /// Columns the result is sorted on, most significant first.
    fn sorted_on(&self) -> Vec<usize> {
        Vec::new()
    }

    /// Identifies the result for operator-level caching.
    fn cache_key(&self) -> String;

    fn known_empty_result(&self) -> bool {
        self.size_estimate() == 0
    }

    fn descriptor(&self) -> String;
}

/// A subtree whose result is already in memory, e.g. an inline `VALUES`
/// block or the output of an operator evaluated earlier.
#[derive(Debug, Clone)]
pub struct MaterializedSubtree {
    table: Arc<IdTable>,
    variables: VariableColumns,
    sorted_on: Vec<usize>,
    label: String,
}

impl MaterializedSubtree {
    pub fn new(table: IdTable, variables: VariableColumns) -> Self {
        let sorted_on = if table.num_columns() > 0 && table.is_sorted_on(0) {
            vec![0]
        } else {
            Vec::new()
        };
        Self {
            table: Arc::new(table),
            variables,
            sorted_on,
            label: "VALUES".to_string(),
        }
    }

    /// Name shown in descriptors and cache keys.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Re-sort the table on `col`.
    pub fn sorted_by(mut self, col: usize) -> Self {
        if !self.table.is_sorted_on(col) {
            self.table = Arc::new(self.table.sorted_on(col));
        }
        self.sorted_on = vec![col];
        self
    }

    pub fn table(&self) -> &IdTable {
        &self.table
    }
}

impl Subtree for MaterializedSubtree {
    fn result(&self, _ctx: &ExecutionContext) -> Result<Arc<IdTable>> {
        Ok(Arc::clone(&self.table))
    }

    fn result_width(&self) -> usize {
        self.table.num_columns()
    }

    fn variable_columns(&self) -> VariableColumns {
        self.variables.clone()
    }

    fn size_estimate(&self) -> u64 {
        self.table.num_rows() as u64
    }

    fn cost_estimate(&self) -> u64 {
        self.table.num_rows() as u64
    }

    fn sorted_on(&self) -> Vec<usize> {
        self.sorted_on.clone()
    }

    fn cache_key(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.table.hash(&mut hasher);
        format!(
            "{} {}x{} {:016x}",
            self.label,
            self.table.num_rows(),
            self.table.num_columns(),
            hasher.finish()
        )
    }

    fn known_empty_result(&self) -> bool {
        self.table.is_empty()
    }

    fn descriptor(&self) -> String {
        let vars: Vec<&str> = self.variables.keys().map(|v| v.name()).collect();
        format!("{} {}", self.label, vars.join(" "))
    }
}
