//! Transitive hull: every `(start, end)` pair connected by a walk whose
//! length lies in a [`DistanceBound`], computed by one of two strategies that
//! must agree on every input.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::RuntimeParameters;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::graph::{Adjacency, AdjacencyView};
use crate::ids::NodeId;
use crate::matrix::{self, BitMatrix, NodeIndex};
use crate::traversal::{run_graph_search, GraphSearchProblem};

/// Inclusive range of admissible path lengths. `max == None` is unbounded.
///
/// `min <= max` is the caller's responsibility and is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistanceBound {
    pub min: usize,
    pub max: Option<usize>,
}

impl DistanceBound {
    pub const fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// `p+`
    pub const fn one_or_more() -> Self {
        Self::new(1, None)
    }

    /// `p*`
    pub const fn zero_or_more() -> Self {
        Self::new(0, None)
    }

    /// `p{n}`
    pub const fn exactly(n: usize) -> Self {
        Self::new(n, Some(n))
    }

    /// `p{min,max}`
    pub const fn between(min: usize, max: usize) -> Self {
        Self::new(min, Some(max))
    }

    /// `p{min,}`
    pub const fn at_least(min: usize) -> Self {
        Self::new(min, None)
    }

    pub fn contains(&self, length: usize) -> bool {
        length >= self.min && self.max.map_or(true, |max| length <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }
}

impl fmt::Display for DistanceBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, inf]", self.min),
        }
    }
}

/// Strategy family used for a whole evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One boolean-matrix closure over all start nodes at once.
    Matrix,
    /// One bounded graph search per start node.
    Search,
}

impl Strategy {
    pub fn from_parameters(params: &RuntimeParameters) -> Self {
        if params.use_matrix_transitive_path {
            Strategy::Matrix
        } else {
            Strategy::Search
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Matrix => f.write_str("matrix"),
            Strategy::Search => f.write_str("search"),
        }
    }
}

/// Which start nodes a hull is computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartNodes {
    /// Every node with an outgoing edge.
    AllSources,
    /// Explicit start nodes. Duplicates are computed once.
    Nodes(Vec<NodeId>),
}

/// Which end nodes are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndFilter {
    Any,
    /// A single target; searches can stop as soon as it is reached.
    Node(NodeId),
    Nodes(HashSet<NodeId>),
}

impl EndFilter {
    fn accepts(&self, node: NodeId) -> bool {
        match self {
            EndFilter::Any => true,
            EndFilter::Node(target) => *target == node,
            EndFilter::Nodes(targets) => targets.contains(&node),
        }
    }
}

/// Reached end nodes per start node.
#[derive(Debug, Clone, Default)]
pub struct Hull {
    starts: Vec<NodeId>,
    reached: HashMap<NodeId, Vec<NodeId>>,
}

impl Hull {
    fn insert(&mut self, start: NodeId, ends: Vec<NodeId>) {
        self.starts.push(start);
        self.reached.insert(start, ends);
    }

    /// End nodes reached from `start`. Empty if `start` reaches nothing or
    /// was not among the requested start nodes.
    pub fn reached_from(&self, start: NodeId) -> &[NodeId] {
        self.reached.get(&start).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, start: NodeId, end: NodeId) -> bool {
        self.reached_from(start).contains(&end)
    }

    /// Distinct start nodes the hull was computed for, in request order.
    pub fn start_nodes(&self) -> &[NodeId] {
        &self.starts
    }

    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.starts
            .iter()
            .flat_map(move |&s| self.reached_from(s).iter().map(move |&e| (s, e)))
    }

    /// Number of `(start, end)` pairs.
    pub fn len(&self) -> usize {
        self.reached.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute the hull of `view` for `starts`, keeping only ends accepted by
/// `ends`, with the given strategy.
pub fn compute_hull(
    view: &AdjacencyView,
    starts: &StartNodes,
    ends: &EndFilter,
    bound: DistanceBound,
    strategy: Strategy,
    ctx: &ExecutionContext,
) -> Result<Hull> {
    let start_nodes = distinct_starts(view, starts);
    let timer = Instant::now();

    let hull = match strategy {
        Strategy::Matrix => matrix_hull(view, &start_nodes, ends, bound, ctx)?,
        Strategy::Search => search_hull(view, &start_nodes, ends, bound, ctx)?,
    };

    tracing::debug!(
        %strategy,
        %bound,
        start_nodes = start_nodes.len(),
        pairs = hull.len(),
        elapsed_us = timer.elapsed().as_micros() as u64,
        "transitive hull computed"
    );
    Ok(hull)
}

fn distinct_starts(view: &AdjacencyView, starts: &StartNodes) -> Vec<NodeId> {
    match starts {
        StartNodes::AllSources => view.source_nodes().to_vec(),
        StartNodes::Nodes(nodes) => {
            let mut seen = HashSet::with_capacity(nodes.len());
            nodes.iter().copied().filter(|n| seen.insert(*n)).collect()
        }
    }
}

fn search_hull(
    view: &AdjacencyView,
    starts: &[NodeId],
    ends: &EndFilter,
    bound: DistanceBound,
    ctx: &ExecutionContext,
) -> Result<Hull> {
    let target = match ends {
        EndFilter::Node(t) => Some(*t),
        _ => None,
    };
    let mut hull = Hull::default();
    for &start in starts {
        ctx.check_cancellation(|| format!("transitive hull from {}", start))?;
        let problem = GraphSearchProblem {
            start,
            target,
            bound,
        };
        let mut result = run_graph_search(view, &problem, ctx)?;
        result.reached.retain(|&n| ends.accepts(n));
        hull.insert(start, result.reached);
    }
    Ok(hull)
}

fn matrix_hull(
    view: &AdjacencyView,
    starts: &[NodeId],
    ends: &EndFilter,
    bound: DistanceBound,
    ctx: &ExecutionContext,
) -> Result<Hull> {
    // Start and target nodes that are not in the relation still need a
    // column so that their zero-length pair can show up.
    let mut index = NodeIndex::from_nodes(view.nodes());
    let rows: Vec<usize> = starts.iter().map(|&s| index.insert(s)).collect();
    let target_col = match ends {
        EndFilter::Node(t) => Some(index.insert(*t)),
        _ => None,
    };

    let n = index.len();
    let _reservation = ctx
        .budget()
        .reserve(index.memory_usage() + BitMatrix::bytes_for(n, n))?;
    let adjacency = BitMatrix::from_adjacency(view, &index);
    let start = BitMatrix::selector(&rows, n);

    let mut closure = matrix::transitive_hull(&adjacency, &start, bound, ctx)?;
    if let Some(col) = target_col {
        closure.retain_column(col);
    }

    let mut hull = Hull::default();
    for (row, &start) in starts.iter().enumerate() {
        let reached: Vec<NodeId> = closure
            .row_ones(row)
            .map(|col| index.node(col))
            .filter(|&node| ends.accepts(node))
            .collect();
        hull.insert(start, reached);
    }
    Ok(hull)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyKind;
    use crate::ids::IdTable;

    const SAMPLE: [(NodeId, NodeId); 6] = [(0, 2), (2, 4), (4, 7), (0, 7), (3, 3), (7, 0)];

    fn views(edges: &[(NodeId, NodeId)]) -> Vec<AdjacencyView> {
        let table = IdTable::from_edges(edges.iter().copied()).sorted_on(0);
        vec![
            AdjacencyView::from_table(&table, 0, 1, AdjacencyKind::Sorted),
            AdjacencyView::from_table(&table, 0, 1, AdjacencyKind::Hashed),
        ]
    }

    fn sorted_pairs(hull: &Hull) -> Vec<(NodeId, NodeId)> {
        let mut pairs: Vec<_> = hull.pairs().collect();
        pairs.sort_unstable();
        pairs
    }

    fn all_ways(
        edges: &[(NodeId, NodeId)],
        starts: StartNodes,
        ends: EndFilter,
        bound: DistanceBound,
    ) -> Vec<(NodeId, NodeId)> {
        let ctx = ExecutionContext::new();
        let mut results = Vec::new();
        for view in views(edges) {
            for strategy in [Strategy::Matrix, Strategy::Search] {
                let hull = compute_hull(&view, &starts, &ends, bound, strategy, &ctx).unwrap();
                results.push(sorted_pairs(&hull));
            }
        }
        for r in &results[1..] {
            assert_eq!(r, &results[0]);
        }
        results.swap_remove(0)
    }

    #[test]
    fn test_bound_helpers() {
        assert!(DistanceBound::one_or_more().contains(1));
        assert!(!DistanceBound::one_or_more().contains(0));
        assert!(DistanceBound::zero_or_more().contains(1000));
        assert!(!DistanceBound::between(2, 3).contains(4));
        assert_eq!(DistanceBound::exactly(2).to_string(), "[2, 2]");
        assert_eq!(DistanceBound::one_or_more().to_string(), "[1, inf]");
    }

    #[test]
    fn test_free_free_bounded_scenario() {
        let pairs = all_ways(
            &SAMPLE,
            StartNodes::AllSources,
            EndFilter::Any,
            DistanceBound::between(1, 2),
        );
        let mut expected = vec![
            (0, 2),
            (0, 4),
            (0, 7),
            (0, 0),
            (2, 4),
            (2, 7),
            (4, 7),
            (4, 0),
            (3, 3),
            (7, 0),
            (7, 2),
            (7, 7),
        ];
        expected.sort_unstable();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_fixed_start_unbounded_scenario() {
        let pairs = all_ways(
            &SAMPLE,
            StartNodes::Nodes(vec![0]),
            EndFilter::Any,
            DistanceBound::one_or_more(),
        );
        assert_eq!(pairs, vec![(0, 0), (0, 2), (0, 4), (0, 7)]);
    }

    #[test]
    fn test_fixed_fixed_membership() {
        let reach = |start, end, bound| {
            !all_ways(&SAMPLE, StartNodes::Nodes(vec![start]), EndFilter::Node(end), bound)
                .is_empty()
        };
        assert!(reach(0, 4, DistanceBound::one_or_more()));
        assert!(reach(2, 2, DistanceBound::one_or_more()));
        assert!(!reach(3, 0, DistanceBound::one_or_more()));
        assert!(!reach(0, 4, DistanceBound::exactly(1)));
        assert!(reach(5, 5, DistanceBound::zero_or_more()));
        assert!(!reach(5, 5, DistanceBound::one_or_more()));
    }

    #[test]
    fn test_zero_length_pairs() {
        let pairs = all_ways(
            &SAMPLE,
            StartNodes::Nodes(vec![3, 9]),
            EndFilter::Any,
            DistanceBound::between(0, 1),
        );
        assert_eq!(pairs, vec![(3, 3), (9, 9)]);
    }

    #[test]
    fn test_end_set_filter() {
        let ends = EndFilter::Nodes([0, 4].into_iter().collect());
        let pairs = all_ways(
            &SAMPLE,
            StartNodes::Nodes(vec![0, 2, 2]),
            ends,
            DistanceBound::one_or_more(),
        );
        assert_eq!(pairs, vec![(0, 0), (0, 4), (2, 0), (2, 4)]);
    }

    #[test]
    fn test_duplicate_starts_computed_once() {
        let view = &views(&SAMPLE)[0];
        let hull = compute_hull(
            view,
            &StartNodes::Nodes(vec![4, 4, 0, 4]),
            &EndFilter::Any,
            DistanceBound::exactly(1),
            Strategy::Search,
            &ExecutionContext::new(),
        )
        .unwrap();
        assert_eq!(hull.start_nodes(), &[4, 0]);
        assert!(hull.contains(4, 7));
        assert_eq!(hull.len(), 3);
    }

    #[test]
    fn test_empty_relation() {
        assert!(all_ways(&[], StartNodes::AllSources, EndFilter::Any, DistanceBound::one_or_more())
            .is_empty());
    }

    #[test]
    fn test_strategy_from_parameters() {
        let mut p = RuntimeParameters::default();
        assert_eq!(Strategy::from_parameters(&p), Strategy::Matrix);
        p.use_matrix_transitive_path = false;
        assert_eq!(Strategy::from_parameters(&p), Strategy::Search);
    }
}
