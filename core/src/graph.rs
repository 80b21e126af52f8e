use std::collections::HashMap;

use crate::ids::{IdTable, NodeId};

/// Read-only successor lookup over an edge relation.
///
/// Both backends return the same successor sequence for the same relation;
/// they only trade build cost against lookup cost.
pub trait Adjacency {
    /// Direct successors of `node`, in input order. Empty for unknown nodes.
    fn successors(&self, node: NodeId) -> &[NodeId];

    /// Distinct nodes with at least one outgoing edge, ascending.
    fn source_nodes(&self) -> &[NodeId];

    fn edge_count(&self) -> usize;

    /// Approximate memory usage in bytes.
    fn memory_usage(&self) -> usize;
}

/// Adjacency over edges sorted by start node: one binary search per lookup,
/// no build step beyond copying the two columns.
#[derive(Debug, Clone, Default)]
pub struct SortedAdjacency {
    starts: Vec<NodeId>,
    ends: Vec<NodeId>,
    sources: Vec<NodeId>,
}

impl SortedAdjacency {
    /// `edges` must be sorted ascending on the start node.
    pub fn from_sorted_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut adj = Self::default();
        for (from, to) in edges {
            debug_assert!(
                adj.starts.last().map_or(true, |&last| last <= from),
                "SortedAdjacency input is not sorted on the start column"
            );
            if adj.sources.last() != Some(&from) {
                adj.sources.push(from);
            }
            adj.starts.push(from);
            adj.ends.push(to);
        }
        adj
    }
}

impl Adjacency for SortedAdjacency {
    fn successors(&self, node: NodeId) -> &[NodeId] {
        let lo = self.starts.partition_point(|&s| s < node);
        let hi = lo + self.starts[lo..].partition_point(|&s| s == node);
        &self.ends[lo..hi]
    }

    fn source_nodes(&self) -> &[NodeId] {
        &self.sources
    }

    fn edge_count(&self) -> usize {
        self.starts.len()
    }

    fn memory_usage(&self) -> usize {
        use std::mem::size_of;
        (self.starts.len() + self.ends.len() + self.sources.len()) * size_of::<NodeId>()
    }
}

/// Adjacency lists in a hash map: one O(n) pass to build, O(1) lookups.
#[derive(Debug, Clone, Default)]
pub struct HashedAdjacency {
    outgoing: HashMap<NodeId, Vec<NodeId>>,
    sources: Vec<NodeId>,
    edge_count: usize,
}

impl HashedAdjacency {
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            outgoing: HashMap::with_capacity(node_count),
            sources: Vec::with_capacity(node_count),
            edge_count: 0,
        }
    }

    /// Build from edges in any order; successor lists keep input order.
    /// The iterator's lower size bound pre-sizes the map.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let edges = edges.into_iter();
        let mut adj = Self::with_capacity(edges.size_hint().0);
        for (from, to) in edges {
            adj.add_edge(from, to);
        }
        adj.sources.sort_unstable();
        adj
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let targets = self.outgoing.entry(from).or_default();
        if targets.is_empty() {
            self.sources.push(from);
        }
        targets.push(to);
        self.edge_count += 1;
    }
}

impl Adjacency for HashedAdjacency {
    fn successors(&self, node: NodeId) -> &[NodeId] {
        self.outgoing.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn source_nodes(&self) -> &[NodeId] {
        &self.sources
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let lists = self.outgoing.len() * (size_of::<NodeId>() + size_of::<Vec<NodeId>>() + 16);
        let edges = self.edge_count * size_of::<NodeId>();
        lists + edges + self.sources.len() * size_of::<NodeId>()
    }
}

/// Which adjacency backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacencyKind {
    Sorted,
    Hashed,
}

/// The adjacency view one evaluation works on.
#[derive(Debug, Clone)]
pub enum AdjacencyView {
    Sorted(SortedAdjacency),
    Hashed(HashedAdjacency),
}

impl AdjacencyView {
    /// Build from two columns of `table`. For [`AdjacencyKind::Sorted`] the
    /// table must be sorted on `start_col`.
    pub fn from_table(
        table: &IdTable,
        start_col: usize,
        end_col: usize,
        kind: AdjacencyKind,
    ) -> Self {
        let edges = table.rows().map(|row| (row[start_col], row[end_col]));
        match kind {
            AdjacencyKind::Sorted => {
                AdjacencyView::Sorted(SortedAdjacency::from_sorted_edges(edges))
            }
            AdjacencyKind::Hashed => AdjacencyView::Hashed(HashedAdjacency::from_edges(edges)),
        }
    }

    pub fn kind(&self) -> AdjacencyKind {
        match self {
            AdjacencyView::Sorted(_) => AdjacencyKind::Sorted,
            AdjacencyView::Hashed(_) => AdjacencyKind::Hashed,
        }
    }

    /// Every distinct node appearing as a start or end of an edge, ascending.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.source_nodes().to_vec();
        for &source in self.source_nodes() {
            nodes.extend_from_slice(self.successors(source));
        }
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

impl Adjacency for AdjacencyView {
    fn successors(&self, node: NodeId) -> &[NodeId] {
        match self {
            AdjacencyView::Sorted(a) => a.successors(node),
            AdjacencyView::Hashed(a) => a.successors(node),
        }
    }

    fn source_nodes(&self) -> &[NodeId] {
        match self {
            AdjacencyView::Sorted(a) => a.source_nodes(),
            AdjacencyView::Hashed(a) => a.source_nodes(),
        }
    }

    fn edge_count(&self) -> usize {
        match self {
            AdjacencyView::Sorted(a) => a.edge_count(),
            AdjacencyView::Hashed(a) => a.edge_count(),
        }
    }

    fn memory_usage(&self) -> usize {
        match self {
            AdjacencyView::Sorted(a) => a.memory_usage(),
            AdjacencyView::Hashed(a) => a.memory_usage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_edges() -> Vec<(NodeId, NodeId)> {
        vec![(0, 2), (0, 7), (2, 4), (3, 3), (4, 7), (7, 0)]
    }

    fn both_views(edges: &[(NodeId, NodeId)]) -> [AdjacencyView; 2] {
        let table = IdTable::from_edges(edges.iter().copied()).sorted_on(0);
        [
            AdjacencyView::from_table(&table, 0, 1, AdjacencyKind::Sorted),
            AdjacencyView::from_table(&table, 0, 1, AdjacencyKind::Hashed),
        ]
    }

    #[test]
    fn test_successors_match_across_backends() {
        let [sorted, hashed] = both_views(&sample_edges());
        for node in 0..10 {
            assert_eq!(sorted.successors(node), hashed.successors(node), "node {}", node);
        }
        assert_eq!(sorted.successors(0), &[2, 7]);
        assert_eq!(sorted.successors(3), &[3]);
    }

    #[test]
    fn test_unknown_node_has_no_successors() {
        for view in both_views(&sample_edges()) {
            assert!(view.successors(999).is_empty());
            assert!(view.successors(1).is_empty());
        }
    }

    #[test]
    fn test_source_nodes_distinct_and_sorted() {
        for view in both_views(&sample_edges()) {
            assert_eq!(view.source_nodes(), &[0, 2, 3, 4, 7]);
            assert_eq!(view.edge_count(), 6);
        }
    }

    #[test]
    fn test_nodes_include_pure_targets() {
        let [sorted, hashed] = both_views(&[(1, 5), (1, 6), (6, 9)]);
        assert_eq!(sorted.nodes(), vec![1, 5, 6, 9]);
        assert_eq!(hashed.nodes(), vec![1, 5, 6, 9]);
    }

    #[test]
    fn test_parallel_edges_preserved() {
        for view in both_views(&[(0, 1), (0, 1), (0, 1)]) {
            assert_eq!(view.successors(0), &[1, 1, 1]);
            assert_eq!(view.source_nodes(), &[0]);
        }
    }

    #[test]
    fn test_reversed_columns() {
        let table = IdTable::from_edges(sample_edges()).sorted_on(1);
        let view = AdjacencyView::from_table(&table, 1, 0, AdjacencyKind::Sorted);
        let mut preds = view.successors(7).to_vec();
        preds.sort_unstable();
        assert_eq!(preds, vec![0, 4]);
    }

    #[test]
    fn test_empty_relation() {
        for view in both_views(&[]) {
            assert!(view.source_nodes().is_empty());
            assert!(view.successors(0).is_empty());
            assert!(view.nodes().is_empty());
        }
    }

    #[test]
    fn test_memory_usage_nonzero() {
        for view in both_views(&sample_edges()) {
            assert!(view.memory_usage() > 0);
        }
    }

    #[test]
    fn test_hashed_from_unsorted_edges() {
        let adj = HashedAdjacency::from_edges(vec![(5, 1), (2, 3), (5, 2)]);
        assert_eq!(adj.source_nodes(), &[2, 5]);
        assert_eq!(adj.successors(5), &[1, 2]);
    }

    #[test]
    fn test_hashed_view_matches_from_edges() {
        let edges = vec![(7, 0), (2, 4), (0, 7), (4, 7), (0, 2), (3, 3)];
        let table = IdTable::from_edges(edges.iter().copied());
        let view = AdjacencyView::from_table(&table, 0, 1, AdjacencyKind::Hashed);
        let direct = HashedAdjacency::from_edges(edges);
        assert_eq!(view.kind(), AdjacencyKind::Hashed);
        assert_eq!(view.source_nodes(), direct.source_nodes());
        assert_eq!(view.edge_count(), direct.edge_count());
        for node in 0..8 {
            assert_eq!(view.successors(node), direct.successors(node), "node {}", node);
        }
    }
}
