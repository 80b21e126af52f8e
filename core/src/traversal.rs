use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::graph::Adjacency;
use crate::hull::DistanceBound;
use crate::ids::NodeId;

/// One bounded reachability query from a single start node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSearchProblem {
    pub start: NodeId,
    /// When set, only this node is of interest and the search may stop as
    /// soon as it is reached within the bound.
    pub target: Option<NodeId>,
    pub bound: DistanceBound,
}

/// Result of a traversal operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Nodes reachable from the start within the bound, each listed once.
    pub reached: Vec<NodeId>,
    pub nodes_visited: usize,
}

/// Pick the search that fits the problem: depth-first with early exit when a
/// target is set, breadth-first expansion otherwise.
pub fn run_graph_search<A: Adjacency + ?Sized>(
    adjacency: &A,
    problem: &GraphSearchProblem,
    ctx: &ExecutionContext,
) -> Result<SearchResult> {
    match problem.target {
        Some(_) => depth_first_search(adjacency, problem, ctx),
        None => bounded_bfs(adjacency, problem.start, problem.bound, ctx),
    }
}

/// Level-by-level expansion from `start`, collecting every node reachable by
/// a walk whose length lies in `bound`.
///
/// Below `bound.min` each level holds the distinct nodes at exactly that
/// distance, so nodes on cycles are revisited. From `bound.min` on, a node
/// enters the result the first time it is reached and is never expanded
/// again, which keeps unbounded searches finite on cycles.
pub fn bounded_bfs<A: Adjacency + ?Sized>(
    adjacency: &A,
    start: NodeId,
    bound: DistanceBound,
    ctx: &ExecutionContext,
) -> Result<SearchResult> {
    let mut reservation = ctx.budget().reserve(0)?;
    let mut reached: Vec<NodeId> = Vec::new();
    let mut in_result: HashSet<NodeId> = HashSet::new();
    let mut frontier: Vec<NodeId> = vec![start];
    let mut nodes_visited = 0usize;
    let mut depth = 0usize;

    while !frontier.is_empty() {
        let mut next: Vec<NodeId> = Vec::new();
        let mut queued: HashSet<NodeId> = HashSet::new();
        let within_min = depth >= bound.min;

        for &node in &frontier {
            if within_min {
                if !in_result.insert(node) {
                    continue;
                }
                reached.push(node);
            }
            nodes_visited += 1;

            if bound.max.is_some_and(|max| depth >= max) {
                continue;
            }
            ctx.check_cancellation(|| format!("bounded search from {} at depth {}", start, depth))?;

            let next_within_min = depth + 1 >= bound.min;
            for &succ in adjacency.successors(node) {
                if next_within_min && in_result.contains(&succ) {
                    continue;
                }
                if queued.insert(succ) {
                    next.push(succ);
                }
            }
        }

        reservation.grow_to(search_bytes(in_result.len() + reached.len(), next.len() * 2))?;
        frontier = next;
        depth += 1;
    }

    Ok(SearchResult {
        reached,
        nodes_visited,
    })
}

struct Frame<'a> {
    successors: &'a [NodeId],
    next: usize,
    depth: usize,
}

/// Depth-first search for `problem.target` with an explicit stack.
///
/// Returns `[target]` once it is reached at a depth inside the bound and an
/// empty result otherwise. A problem without a target yields an empty result;
/// use [`run_graph_search`] to get the target-free expansion.
///
/// Each `(node, min(depth, bound.min))` pair remembers the shallowest depth it
/// was entered at; a node is re-entered only at a strictly shallower depth.
/// Past `bound.min` a shallower visit reaches everything a deeper one would,
/// so this prunes exactly the redundant branches and terminates on cycles.
pub fn depth_first_search<A: Adjacency + ?Sized>(
    adjacency: &A,
    problem: &GraphSearchProblem,
    ctx: &ExecutionContext,
) -> Result<SearchResult> {
    let Some(target) = problem.target else {
        return Ok(SearchResult::default());
    };
    let bound = problem.bound;
    let found = |nodes_visited| SearchResult {
        reached: vec![target],
        nodes_visited,
    };

    if bound.min == 0 && problem.start == target {
        return Ok(found(1));
    }
    if bound.max == Some(0) {
        return Ok(SearchResult {
            reached: Vec::new(),
            nodes_visited: 1,
        });
    }

    let mut reservation = ctx.budget().reserve(0)?;
    let mut shallowest: HashMap<(NodeId, usize), usize> = HashMap::new();
    shallowest.insert((problem.start, 0), 0);
    let mut stack = vec![Frame {
        successors: adjacency.successors(problem.start),
        next: 0,
        depth: 0,
    }];
    let mut nodes_visited = 1usize;

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.successors.len() {
            stack.pop();
            continue;
        }
        let node = frame.successors[frame.next];
        frame.next += 1;
        let depth = frame.depth + 1;

        if depth >= bound.min && node == target {
            return Ok(found(nodes_visited + 1));
        }

        match shallowest.entry((node, depth.min(bound.min))) {
            Entry::Occupied(e) if *e.get() <= depth => continue,
            Entry::Occupied(mut e) => {
                e.insert(depth);
            }
            Entry::Vacant(e) => {
                e.insert(depth);
            }
        }
        nodes_visited += 1;

        if bound.max.map_or(true, |max| depth < max) {
            ctx.check_cancellation(|| {
                format!("depth-first search from {} to {}", problem.start, target)
            })?;
            stack.push(Frame {
                successors: adjacency.successors(node),
                next: 0,
                depth,
            });
            reservation.grow_to(search_bytes(shallowest.len() * 3, stack.len() * 4))?;
        }
    }

    Ok(SearchResult {
        reached: Vec::new(),
        nodes_visited,
    })
}

/// Rough bookkeeping footprint: hashed node entries plus plain words.
fn search_bytes(hashed_entries: usize, words: usize) -> usize {
    (hashed_entries * 2 + words) * std::mem::size_of::<NodeId>()
}
