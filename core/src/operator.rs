//! The transitive-path operator: evaluates `?x p{min,max} ?y` over the
//! result of a base subtree, with either side fixed, free, or bound to the
//! result of another subtree (join pushdown).

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::graph::{Adjacency, AdjacencyKind, AdjacencyView};
use crate::hull::{compute_hull, DistanceBound, EndFilter, Hull, StartNodes, Strategy};
use crate::ids::{IdTable, NodeId, Variable, VariableColumns};
use crate::subtree::Subtree;

/// Size estimate used when either side is a fixed node.
const FIXED_SIDE_SIZE_ESTIMATE: u64 = 1000;
/// Blowup assumed for the full hull of a relation with both sides free.
const FREE_HULL_BLOWUP: u64 = 10_000;

/// A free side that was bound to one column of another subtree's result.
#[derive(Debug, Clone)]
pub struct BoundSide {
    pub variable: Variable,
    pub subtree: Arc<dyn Subtree>,
    /// Column of `subtree`'s result holding the candidate nodes.
    pub column: usize,
}

#[derive(Debug, Clone)]
pub enum SideValue {
    Fixed(NodeId),
    Free(Variable),
    Bound(BoundSide),
}

/// One endpoint of a transitive path.
#[derive(Debug, Clone)]
pub struct TransitivePathSide {
    pub value: SideValue,
    /// Column of the base relation holding this side's nodes.
    pub sub_column: usize,
}

impl TransitivePathSide {
    pub fn fixed(node: NodeId, sub_column: usize) -> Self {
        Self {
            value: SideValue::Fixed(node),
            sub_column,
        }
    }

    pub fn free(variable: Variable, sub_column: usize) -> Self {
        Self {
            value: SideValue::Free(variable),
            sub_column,
        }
    }

    pub fn is_variable(&self) -> bool {
        !matches!(self.value, SideValue::Fixed(_))
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.value, SideValue::Bound(_))
    }

    pub fn is_free(&self) -> bool {
        matches!(self.value, SideValue::Free(_))
    }

    pub fn variable(&self) -> Option<&Variable> {
        match &self.value {
            SideValue::Fixed(_) => None,
            SideValue::Free(v) => Some(v),
            SideValue::Bound(b) => Some(&b.variable),
        }
    }

    fn bound(&self) -> Option<&BoundSide> {
        match &self.value {
            SideValue::Bound(b) => Some(b),
            _ => None,
        }
    }

    /// Number of pass-through columns this side adds to the output.
    fn extra_width(&self) -> usize {
        self.bound()
            .map_or(0, |b| b.subtree.result_width().saturating_sub(1))
    }

    fn is_sorted_on_input_column(&self) -> bool {
        self.bound()
            .is_some_and(|b| b.subtree.sorted_on().first() == Some(&b.column))
    }

    fn name(&self) -> String {
        match &self.value {
            SideValue::Fixed(id) => format!("#{}", id),
            SideValue::Free(v) => v.to_string(),
            SideValue::Bound(b) => b.variable.to_string(),
        }
    }

    fn cache_key(&self) -> String {
        let mut key = String::new();
        if let SideValue::Fixed(id) = self.value {
            key.push_str(&format!("Id: {}", id));
        }
        key.push_str(&format!(", subColumn: {}", self.sub_column));
        if let Some(b) = self.bound() {
            key.push_str(&format!(
                ", Subtree:\n{} with join column {}\n",
                b.subtree.cache_key(),
                b.column
            ));
        }
        key
    }
}

/// Side the hull computation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LeftToRight => f.write_str("left-to-right"),
            Direction::RightToLeft => f.write_str("right-to-left"),
        }
    }
}

/// A bound side's materialized input during one evaluation.
struct BoundInput {
    table: Arc<IdTable>,
    column: usize,
}

impl BoundInput {
    fn load(side: &BoundSide, ctx: &ExecutionContext) -> Result<Self> {
        let table = side.subtree.result(ctx)?;
        let expected = side.subtree.result_width();
        if table.num_columns() != expected {
            return Err(Error::WidthMismatch {
                expected,
                actual: table.num_columns(),
            });
        }
        if side.column >= expected {
            return Err(Error::ColumnOutOfRange {
                column: side.column,
                width: expected,
            });
        }
        Ok(Self {
            table,
            column: side.column,
        })
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.table.column(self.column).collect()
    }

    fn rows_by_node(&self) -> HashMap<NodeId, Vec<usize>> {
        let mut index: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (i, row) in self.table.rows().enumerate() {
            index.entry(row[self.column]).or_default().push(i);
        }
        index
    }
}

/// A node of one output row plus the bound input row it came from, if any.
#[derive(Clone, Copy)]
struct Endpoint<'a> {
    node: NodeId,
    row: Option<(&'a [NodeId], usize)>,
}

fn push_extras(buf: &mut Vec<NodeId>, row: Option<(&[NodeId], usize)>) {
    if let Some((row, join_column)) = row {
        buf.extend(
            row.iter()
                .enumerate()
                .filter(|&(i, _)| i != join_column)
                .map(|(_, &v)| v),
        );
    }
}

/// `?left p{min,max} ?right` over the relation produced by `subtree`.
///
/// Output columns are `[left-extra..., left, right, right-extra...]`, where
/// the extras are the non-join columns of a side bound to another subtree.
#[derive(Debug, Clone)]
pub struct TransitivePath {
    subtree: Arc<dyn Subtree>,
    left: TransitivePathSide,
    right: TransitivePathSide,
    bound: DistanceBound,
    variable_columns: VariableColumns,
    result_width: usize,
}

impl TransitivePath {
    pub fn new(
        subtree: Arc<dyn Subtree>,
        left: TransitivePathSide,
        right: TransitivePathSide,
        bound: DistanceBound,
    ) -> Self {
        let mut path = Self {
            subtree,
            left,
            right,
            bound,
            variable_columns: VariableColumns::new(),
            result_width: 0,
        };
        path.compute_layout();
        path
    }

    fn compute_layout(&mut self) {
        let left_col = self.left.extra_width();
        let right_col = left_col + 1;
        let mut columns = VariableColumns::new();

        if let Some(v) = self.left.variable() {
            columns.insert(v.clone(), left_col);
        }
        if let Some(v) = self.right.variable() {
            columns.entry(v.clone()).or_insert(right_col);
        }
        if let Some(b) = self.left.bound() {
            for (var, col) in b.subtree.variable_columns() {
                if col != b.column {
                    let pos = if col < b.column { col } else { col - 1 };
                    columns.entry(var).or_insert(pos);
                }
            }
        }
        if let Some(b) = self.right.bound() {
            for (var, col) in b.subtree.variable_columns() {
                if col != b.column {
                    let pos = if col < b.column { col } else { col - 1 };
                    columns.entry(var).or_insert(right_col + 1 + pos);
                }
            }
        }

        self.result_width = right_col + 1 + self.right.extra_width();
        self.variable_columns = columns;
    }

    pub fn left(&self) -> &TransitivePathSide {
        &self.left
    }

    pub fn right(&self) -> &TransitivePathSide {
        &self.right
    }

    pub fn distance_bound(&self) -> DistanceBound {
        self.bound
    }

    /// Copy of this operator with the left side bound to `column` of
    /// `subtree`. Fails unless the left side is a free variable.
    pub fn bind_left_side(
        &self,
        subtree: Arc<dyn Subtree>,
        column: usize,
    ) -> Result<TransitivePath> {
        let left = Self::bind_side(&self.left, "left", subtree, column)?;
        Ok(Self::new(Arc::clone(&self.subtree), left, self.right.clone(), self.bound))
    }

    /// Mirror of [`bind_left_side`](Self::bind_left_side).
    pub fn bind_right_side(
        &self,
        subtree: Arc<dyn Subtree>,
        column: usize,
    ) -> Result<TransitivePath> {
        let right = Self::bind_side(&self.right, "right", subtree, column)?;
        Ok(Self::new(Arc::clone(&self.subtree), self.left.clone(), right, self.bound))
    }

    fn bind_side(
        side: &TransitivePathSide,
        name: &'static str,
        subtree: Arc<dyn Subtree>,
        column: usize,
    ) -> Result<TransitivePathSide> {
        let SideValue::Free(variable) = &side.value else {
            return Err(Error::SideNotFree { side: name });
        };
        let width = subtree.result_width();
        if column >= width {
            return Err(Error::ColumnOutOfRange { column, width });
        }
        Ok(TransitivePathSide {
            value: SideValue::Bound(BoundSide {
                variable: variable.clone(),
                subtree,
                column,
            }),
            sub_column: side.sub_column,
        })
    }

    /// Bound left side first, then a bound or fixed right side, else left.
    pub fn direction(&self) -> Direction {
        if self.left.is_bound() {
            Direction::LeftToRight
        } else if !self.right.is_free() {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        }
    }

    pub fn compute_result(&self, ctx: &ExecutionContext) -> Result<IdTable> {
        let span = tracing::debug_span!("transitive_path", descriptor = %self.descriptor());
        let _guard = span.enter();

        if self.bound.min == 0 && self.left.is_free() && self.right.is_free() {
            tracing::warn!(bound = %self.bound, "rejecting empty path between two free variables");
            return Err(Error::EmptyPathNotSupported);
        }

        let params = *ctx.parameters();
        let strategy = Strategy::from_parameters(&params);
        let kind = if params.use_binsearch_transitive_path {
            AdjacencyKind::Sorted
        } else {
            AdjacencyKind::Hashed
        };
        let direction = self.direction();
        let (start_side, target_side) = match direction {
            Direction::LeftToRight => (&self.left, &self.right),
            Direction::RightToLeft => (&self.right, &self.left),
        };
        tracing::debug!(%direction, %strategy, ?kind, "transitive path evaluation");

        let timer = Instant::now();
        let base = self.subtree.result(ctx)?;
        for column in [start_side.sub_column, target_side.sub_column] {
            if column >= base.num_columns() {
                return Err(Error::ColumnOutOfRange {
                    column,
                    width: base.num_columns(),
                });
            }
        }
        let edges: Cow<'_, IdTable> = if kind == AdjacencyKind::Sorted
            && !base.is_sorted_on(start_side.sub_column)
        {
            Cow::Owned(base.sorted_on(start_side.sub_column))
        } else {
            Cow::Borrowed(&*base)
        };
        let _edges_reservation = match &edges {
            Cow::Owned(sorted) => Some(ctx.budget().reserve(sorted.memory_usage())?),
            Cow::Borrowed(_) => None,
        };
        let view = AdjacencyView::from_table(
            &edges,
            start_side.sub_column,
            target_side.sub_column,
            kind,
        );
        let _view_reservation = ctx.budget().reserve(view.memory_usage())?;

        let start_input = start_side
            .bound()
            .map(|b| BoundInput::load(b, ctx))
            .transpose()?;
        let target_input = target_side
            .bound()
            .map(|b| BoundInput::load(b, ctx))
            .transpose()?;
        let starts = match (&start_side.value, &start_input) {
            (SideValue::Fixed(id), _) => StartNodes::Nodes(vec![*id]),
            (_, Some(input)) => StartNodes::Nodes(input.nodes()),
            _ => StartNodes::AllSources,
        };
        let ends = match (&target_side.value, &target_input) {
            (SideValue::Fixed(id), _) => EndFilter::Node(*id),
            (_, Some(input)) => {
                EndFilter::Nodes(input.nodes().into_iter().collect::<HashSet<_>>())
            }
            _ => EndFilter::Any,
        };
        let init_us = timer.elapsed().as_micros() as u64;

        let timer = Instant::now();
        let hull = compute_hull(&view, &starts, &ends, self.bound, strategy, ctx)?;
        let hull_us = timer.elapsed().as_micros() as u64;

        let timer = Instant::now();
        let result = self.fill_output(
            &hull,
            direction,
            start_input.as_ref(),
            target_input.as_ref(),
            ctx,
        )?;
        tracing::debug!(
            edges = view.edge_count(),
            rows = result.num_rows(),
            init_us,
            hull_us,
            fill_us = timer.elapsed().as_micros() as u64,
            "transitive path computed"
        );
        Ok(result)
    }

    fn fill_output(
        &self,
        hull: &Hull,
        direction: Direction,
        start_input: Option<&BoundInput>,
        target_input: Option<&BoundInput>,
        ctx: &ExecutionContext,
    ) -> Result<IdTable> {
        let mut out = IdTable::new(self.result_width);
        let mut reservation = ctx.budget().reserve(0)?;
        let mut buf: Vec<NodeId> = Vec::with_capacity(self.result_width);
        let target_rows = target_input.map(BoundInput::rows_by_node);

        let starts: Box<dyn Iterator<Item = Endpoint<'_>> + '_> = match start_input {
            // One group per input row, so duplicate bound rows keep their own
            // output rows.
            Some(input) => Box::new(input.table.rows().map(move |row| Endpoint {
                node: row[input.column],
                row: Some((row, input.column)),
            })),
            None => Box::new(hull.start_nodes().iter().map(|&node| Endpoint { node, row: None })),
        };

        for start in starts {
            ctx.check_cancellation(|| {
                format!("filling transitive path output for {}", start.node)
            })?;
            for &end in hull.reached_from(start.node) {
                match (target_input, &target_rows) {
                    (Some(input), Some(rows)) => {
                        for &i in rows.get(&end).map(Vec::as_slice).unwrap_or(&[]) {
                            let end = Endpoint {
                                node: end,
                                row: Some((input.table.row(i), input.column)),
                            };
                            self.push_row(&mut out, &mut buf, direction, start, end);
                        }
                    }
                    _ => {
                        let end = Endpoint { node: end, row: None };
                        self.push_row(&mut out, &mut buf, direction, start, end);
                    }
                }
            }
            reservation.grow_to(out.memory_usage())?;
        }
        Ok(out)
    }

    fn push_row(
        &self,
        out: &mut IdTable,
        buf: &mut Vec<NodeId>,
        direction: Direction,
        start: Endpoint<'_>,
        end: Endpoint<'_>,
    ) {
        let (left, right) = match direction {
            Direction::LeftToRight => (start, end),
            Direction::RightToLeft => (end, start),
        };
        buf.clear();
        push_extras(buf, left.row);
        buf.push(left.node);
        buf.push(right.node);
        push_extras(buf, right.row);
        out.push_row(buf);
    }

    pub fn result_width(&self) -> usize {
        self.result_width
    }

    pub fn variable_columns(&self) -> &VariableColumns {
        &self.variable_columns
    }

    /// Output column holding the left side's nodes.
    pub fn left_column(&self) -> usize {
        self.left.extra_width()
    }

    pub fn right_column(&self) -> usize {
        self.left_column() + 1
    }

    pub fn size_estimate(&self) -> u64 {
        if !self.left.is_variable() || !self.right.is_variable() {
            return FIXED_SIDE_SIZE_ESTIMATE;
        }
        if let Some(b) = self.left.bound() {
            return b.subtree.size_estimate();
        }
        if let Some(b) = self.right.bound() {
            return b.subtree.size_estimate();
        }
        self.subtree.size_estimate().saturating_mul(FREE_HULL_BLOWUP)
    }

    /// Proportional to the result size, plus the cost of every child.
    pub fn cost_estimate(&self) -> u64 {
        self.children()
            .iter()
            .fold(self.size_estimate(), |cost, child| {
                cost.saturating_add(child.cost_estimate())
            })
    }

    /// The base subtree followed by the subtrees bound to either side.
    pub fn children(&self) -> Vec<&Arc<dyn Subtree>> {
        let mut children = vec![&self.subtree];
        children.extend(self.left.bound().map(|b| &b.subtree));
        children.extend(self.right.bound().map(|b| &b.subtree));
        children
    }

    /// Rows follow the bound start side's input order, so only that side's
    /// sort order carries over.
    pub fn result_sorted_on(&self) -> Vec<usize> {
        let (side, column) = match self.direction() {
            Direction::LeftToRight => (&self.left, self.left_column()),
            Direction::RightToLeft => (&self.right, self.right_column()),
        };
        if side.is_sorted_on_input_column() {
            vec![column]
        } else {
            Vec::new()
        }
    }

    pub fn descriptor(&self) -> String {
        let mut text = String::from("TransitivePath ");
        if self.bound.min > 1 || self.bound.max.is_some() {
            text.push_str(&format!("{} ", self.bound));
        }
        text.push_str(&format!(
            "{} <{}> {}",
            self.left.name(),
            self.subtree.descriptor(),
            self.right.name()
        ));
        text
    }

    pub fn cache_key(&self) -> String {
        let max = self
            .bound
            .max
            .map_or_else(|| "inf".to_string(), |m| m.to_string());
        format!(
            " minDist {} maxDist {}\nLeft side:\n{}Right side:\n{}Subtree:\n{}\n",
            self.bound.min,
            max,
            self.left.cache_key(),
            self.right.cache_key(),
            self.subtree.cache_key()
        )
    }

    /// True when the result is empty without evaluating anything.
    pub fn known_empty_result(&self) -> bool {
        let bound_empty = [&self.left, &self.right]
            .iter()
            .filter_map(|side| side.bound())
            .any(|b| b.subtree.known_empty_result());
        bound_empty || (self.bound.min > 0 && self.subtree.known_empty_result())
    }

    /// Multiplicities of the output columns are not known.
    pub fn multiplicity(&self, _column: usize) -> f32 {
        1.0
    }

    /// Whether at least one side restricts the hull to specific start or end
    /// nodes.
    pub fn is_bound_or_id(&self) -> bool {
        self.left.is_bound()
            || self.right.is_bound()
            || !self.left.is_variable()
            || !self.right.is_variable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtree::MaterializedSubtree;

    fn var(name: &str) -> Variable {
        Variable::new(name)
    }

    fn edges(pairs: &[(NodeId, NodeId)]) -> Arc<dyn Subtree> {
        let columns = [(var("s"), 0), (var("o"), 1)].into_iter().collect();
        let table = IdTable::from_edges(pairs.iter().copied());
        Arc::new(MaterializedSubtree::new(table, columns).with_label("edges"))
    }

    fn values(width: usize, rows: &[&[NodeId]], names: &[&str]) -> Arc<dyn Subtree> {
        let columns = names.iter().enumerate().map(|(i, n)| (var(n), i)).collect();
        Arc::new(MaterializedSubtree::new(IdTable::from_rows(width, rows.iter()), columns))
    }

    fn free_path(bound: DistanceBound) -> TransitivePath {
        TransitivePath::new(
            edges(&[(1, 2), (2, 3)]),
            TransitivePathSide::free(var("x"), 0),
            TransitivePathSide::free(var("y"), 1),
            bound,
        )
    }

    #[test]
    fn test_free_layout() {
        let p = free_path(DistanceBound::one_or_more());
        assert_eq!(p.result_width(), 2);
        assert_eq!(p.variable_columns()[&var("x")], 0);
        assert_eq!(p.variable_columns()[&var("y")], 1);
        assert_eq!(p.direction(), Direction::LeftToRight);
    }

    #[test]
    fn test_bound_layout() {
        let p = free_path(DistanceBound::one_or_more());
        let left = values(3, &[&[7, 1, 8]], &["a", "x", "b"]);
        let right = values(2, &[&[3, 9]], &["y", "c"]);
        let bound = p.bind_left_side(left, 1).unwrap().bind_right_side(right, 0).unwrap();

        assert_eq!(bound.result_width(), 2 + 2 + 1);
        let cols = bound.variable_columns();
        assert_eq!(cols[&var("a")], 0);
        assert_eq!(cols[&var("b")], 1);
        assert_eq!(cols[&var("x")], 2);
        assert_eq!(cols[&var("y")], 3);
        assert_eq!(cols[&var("c")], 4);
        assert_eq!(bound.left_column(), 2);
        assert_eq!(bound.direction(), Direction::LeftToRight);
    }

    #[test]
    fn test_bind_leaves_original_untouched() {
        let p = free_path(DistanceBound::one_or_more());
        let bound = p.bind_right_side(values(1, &[&[3]], &["y"]), 0).unwrap();
        assert!(p.right().is_free());
        assert!(bound.right().is_bound());
        assert_eq!(bound.direction(), Direction::RightToLeft);
    }

    #[test]
    fn test_bind_rejects_non_free_side() {
        let p = TransitivePath::new(
            edges(&[(1, 2)]),
            TransitivePathSide::fixed(1, 0),
            TransitivePathSide::free(var("y"), 1),
            DistanceBound::one_or_more(),
        );
        assert!(matches!(
            p.bind_left_side(values(1, &[&[1]], &["x"]), 0),
            Err(Error::SideNotFree { side: "left" })
        ));

        let bound = p.bind_right_side(values(1, &[&[2]], &["y"]), 0).unwrap();
        assert!(matches!(
            bound.bind_right_side(values(1, &[&[2]], &["y"]), 0),
            Err(Error::SideNotFree { side: "right" })
        ));
    }

    #[test]
    fn test_bind_rejects_column_out_of_range() {
        let p = free_path(DistanceBound::one_or_more());
        assert!(matches!(
            p.bind_left_side(values(1, &[&[1]], &["x"]), 3),
            Err(Error::ColumnOutOfRange { column: 3, width: 1 })
        ));
    }

    #[test]
    fn test_direction_rules() {
        let fixed_right = TransitivePath::new(
            edges(&[(1, 2)]),
            TransitivePathSide::free(var("x"), 0),
            TransitivePathSide::fixed(2, 1),
            DistanceBound::one_or_more(),
        );
        assert_eq!(fixed_right.direction(), Direction::RightToLeft);

        let fixed_left = TransitivePath::new(
            edges(&[(1, 2)]),
            TransitivePathSide::fixed(1, 0),
            TransitivePathSide::free(var("y"), 1),
            DistanceBound::one_or_more(),
        );
        assert_eq!(fixed_left.direction(), Direction::LeftToRight);

        let both_fixed = TransitivePath::new(
            edges(&[(1, 2)]),
            TransitivePathSide::fixed(1, 0),
            TransitivePathSide::fixed(2, 1),
            DistanceBound::one_or_more(),
        );
        assert_eq!(both_fixed.direction(), Direction::RightToLeft);

        let left_bound = fixed_right
            .bind_left_side(values(1, &[&[1]], &["x"]), 0)
            .unwrap();
        assert_eq!(left_bound.direction(), Direction::LeftToRight);
    }

    #[test]
    fn test_size_and_cost_estimates() {
        let p = free_path(DistanceBound::one_or_more());
        assert_eq!(p.size_estimate(), 2 * FREE_HULL_BLOWUP);
        assert_eq!(p.cost_estimate(), 2 * FREE_HULL_BLOWUP + 2);

        let bound = p.bind_left_side(values(1, &[&[1], &[2], &[3]], &["x"]), 0).unwrap();
        assert_eq!(bound.size_estimate(), 3);
        assert_eq!(bound.cost_estimate(), 3 + 2 + 3);
        assert!(bound.is_bound_or_id());
        assert!(!p.is_bound_or_id());

        let fixed = TransitivePath::new(
            edges(&[(1, 2)]),
            TransitivePathSide::fixed(1, 0),
            TransitivePathSide::free(var("y"), 1),
            DistanceBound::one_or_more(),
        );
        assert_eq!(fixed.size_estimate(), FIXED_SIDE_SIZE_ESTIMATE);
        assert_eq!(fixed.multiplicity(0), 1.0);
    }

    #[test]
    fn test_descriptor() {
        assert_eq!(
            free_path(DistanceBound::one_or_more()).descriptor(),
            "TransitivePath ?x <edges ?o ?s> ?y"
        );
        assert_eq!(
            free_path(DistanceBound::between(1, 3)).descriptor(),
            "TransitivePath [1, 3] ?x <edges ?o ?s> ?y"
        );
    }

    #[test]
    fn test_cache_key_distinguishes_bounds_and_bindings() {
        let a = free_path(DistanceBound::one_or_more());
        let b = free_path(DistanceBound::between(1, 3));
        assert_ne!(a.cache_key(), b.cache_key());
        let bound = a.bind_left_side(values(1, &[&[1]], &["x"]), 0).unwrap();
        assert_ne!(a.cache_key(), bound.cache_key());
        assert_eq!(a.cache_key(), a.clone().cache_key());
    }

    #[test]
    fn test_result_sorted_on_bound_side() {
        let p = free_path(DistanceBound::one_or_more());
        let sorted = values(2, &[&[1, 5], &[2, 6]], &["x", "z"]);
        let bound = p.bind_left_side(sorted, 0).unwrap();
        assert_eq!(bound.result_sorted_on(), vec![bound.left_column()]);

        let unsorted = values(2, &[&[5, 2], &[6, 1]], &["z", "x"]);
        let bound = p.bind_left_side(unsorted, 1).unwrap();
        assert!(bound.result_sorted_on().is_empty());
        assert!(p.result_sorted_on().is_empty());
    }

    #[test]
    fn test_known_empty_result() {
        let empty = TransitivePath::new(
            edges(&[]),
            TransitivePathSide::free(var("x"), 0),
            TransitivePathSide::free(var("y"), 1),
            DistanceBound::one_or_more(),
        );
        assert!(empty.known_empty_result());
        assert!(!free_path(DistanceBound::one_or_more()).known_empty_result());
        let bound = free_path(DistanceBound::zero_or_more())
            .bind_left_side(values(1, &[], &["x"]), 0)
            .unwrap();
        assert!(bound.known_empty_result());
    }

    #[test]
    fn test_rejects_empty_path_between_free_sides() {
        let p = free_path(DistanceBound::zero_or_more());
        assert!(matches!(
            p.compute_result(&ExecutionContext::new()),
            Err(Error::EmptyPathNotSupported)
        ));
    }

    #[test]
    fn test_base_column_out_of_range() {
        let p = TransitivePath::new(
            edges(&[(1, 2)]),
            TransitivePathSide::free(var("x"), 0),
            TransitivePathSide::free(var("y"), 5),
            DistanceBound::one_or_more(),
        );
        assert!(matches!(
            p.compute_result(&ExecutionContext::new()),
            Err(Error::ColumnOutOfRange { column: 5, width: 2 })
        ));
    }
}
