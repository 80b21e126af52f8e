//! transitive-path-core: Bounded transitive-path evaluation.
//!
//! Evaluates SPARQL property paths with a length range (`p+`, `p*`,
//! `p{min,max}`) over an edge relation and returns the reachable
//! `(start, end)` pairs. Two strategies produce identical results: a
//! bit-packed boolean matrix closure over all start nodes at once, and a
//! bounded graph search per start node.
//!
//! Designed as the transitive-path operator of a SPARQL engine, but usable
//! independently for benchmarking and testing.

mod config;
mod context;
mod error;
mod graph;
mod hull;
mod ids;
mod matrix;
mod operator;
mod subtree;
mod traversal;

pub use config::{
    set_parameter, RuntimeParameters, USE_BINSEARCH_TRANSITIVE_PATH, USE_MATRIX_TRANSITIVE_PATH,
};
pub use context::{
    CancellationHandle, CancellationReason, ExecutionContext, MemoryBudget, Reservation,
};
pub use error::{Error, Result};
pub use graph::{Adjacency, AdjacencyKind, AdjacencyView, HashedAdjacency, SortedAdjacency};
pub use hull::{compute_hull, DistanceBound, EndFilter, Hull, StartNodes, Strategy};
pub use ids::{IdTable, NodeId, Variable, VariableColumns};
pub use matrix::{transitive_hull, BitMatrix, NodeIndex};
pub use operator::{BoundSide, Direction, SideValue, TransitivePath, TransitivePathSide};
pub use subtree::{MaterializedSubtree, Subtree};
pub use traversal::{
    bounded_bfs, depth_first_search, run_graph_search, GraphSearchProblem, SearchResult,
};
