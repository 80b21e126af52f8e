use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Interned id of an RDF term in the query's dictionary.
pub type NodeId = u64;

/// A SPARQL variable, stored with its leading `?`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Variable(String);

impl Variable {
    /// Create a variable. A missing `?` prefix is added.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with('?') {
            Self(name)
        } else {
            Self(format!("?{}", name))
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Variable → output column mapping of an operator.
pub type VariableColumns = BTreeMap<Variable, usize>;

/// A row-major relation of node ids with a fixed number of columns.
///
/// This is the shape of every intermediate result the transitive path
/// consumes (base edges, bound-side candidates) and produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdTable {
    width: usize,
    data: Vec<NodeId>,
}

impl IdTable {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(width: usize, rows: usize) -> Self {
        Self {
            width,
            data: Vec::with_capacity(width * rows),
        }
    }

    /// Build a table from rows. Every row must have exactly `width` entries.
    pub fn from_rows<I, R>(width: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[NodeId]>,
    {
        let mut table = Self::new(width);
        for row in rows {
            table.push_row(row.as_ref());
        }
        table
    }

    /// Two-column table from `(start, end)` pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut table = Self::new(2);
        for (from, to) in edges {
            table.push_row(&[from, to]);
        }
        table
    }

    /// Append a row. Panics if the row has the wrong width (a caller bug,
    /// never data-dependent).
    pub fn push_row(&mut self, row: &[NodeId]) {
        assert_eq!(
            row.len(),
            self.width,
            "row of width {} pushed into table of width {}",
            row.len(),
            self.width
        );
        self.data.extend_from_slice(row);
    }

    pub fn num_columns(&self) -> usize {
        self.width
    }

    pub fn num_rows(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> &[NodeId] {
        &self.data[index * self.width..(index + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[NodeId]> + '_ {
        // chunks_exact panics on 0, an empty table of width 0 has no rows anyway.
        self.data.chunks_exact(self.width.max(1))
    }

    /// Iterate one column top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.rows().map(move |row| row[col])
    }

    pub fn is_sorted_on(&self, col: usize) -> bool {
        let mut prev: Option<NodeId> = None;
        for value in self.column(col) {
            if prev.is_some_and(|p| p > value) {
                return false;
            }
            prev = Some(value);
        }
        true
    }

    /// Copy of this table stably sorted ascending on `col`.
    pub fn sorted_on(&self, col: usize) -> IdTable {
        let mut order: Vec<usize> = (0..self.num_rows()).collect();
        order.sort_by_key(|&i| self.row(i)[col]);
        let mut sorted = IdTable::with_capacity(self.width, order.len());
        for i in order {
            sorted.push_row(self.row(i));
        }
        sorted
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        self.data.len() * std::mem::size_of::<NodeId>()
    }
}
