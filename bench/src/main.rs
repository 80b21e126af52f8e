use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tracing_subscriber::EnvFilter;
use transitive_path_core::{
    DistanceBound, ExecutionContext, IdTable, MaterializedSubtree, NodeId, RuntimeParameters,
    Subtree, TransitivePath, TransitivePathSide, Variable,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let json = args.iter().any(|a| a == "--json");
    let positional: Vec<&str> = args[1..]
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.starts_with("--"))
        .collect();

    let mode = positional.first().copied().unwrap_or("all");
    let node_count: u64 = positional.get(1).and_then(|s| s.parse().ok()).unwrap_or(2_000);

    if mode == "help" || args.iter().any(|a| a == "--help") {
        println!("Usage: transitive-path-bench [mode] [node_count] [--json]");
        println!();
        println!("Modes:");
        println!("  all         Run all generators and benchmark each (default)");
        println!("  tree        Branching tree (deep paths, no cycles)");
        println!("  scalefree   Preferential attachment via edge sampling (hub-and-spoke)");
        println!("  smallworld  Watts-Strogatz ring lattice + shortcuts (many cycles)");
        println!("  random      Erdos-Renyi uniform random edges");
        println!("  dla         Diffusion-limited aggregation (organic branching)");
        println!();
        println!("Default node_count: 2000 (the matrix strategy needs node_count^2 bits)");
        println!("--json prints one JSON object per measurement instead of a table.");
        println!("RUST_LOG=transitive_path_core=debug shows per-phase timings.");
        return;
    }

    let generators: Vec<(&str, fn(u64) -> Vec<(NodeId, NodeId)>)> = match mode {
        "tree" => vec![("Branching tree", gen_tree)],
        "scalefree" => vec![("Scale-free (edge sampling)", gen_scale_free)],
        "smallworld" => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        "random" => vec![("Erdos-Renyi random", gen_random)],
        "dla" => vec![("DLA (organic branching)", gen_dla)],
        "all" => vec![
            ("Branching tree", gen_tree as fn(u64) -> Vec<(NodeId, NodeId)>),
            ("Scale-free (edge sampling)", gen_scale_free),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("DLA (organic branching)", gen_dla),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            std::process::exit(2);
        }
    };

    if !json {
        println!("transitive-path-bench");
        println!("=====================");
        println!();
    }

    let mut mismatches = 0;
    for (name, generator) in generators {
        mismatches += run_benchmark(name, generator, node_count, json);
    }
    if mismatches > 0 {
        eprintln!("{} measurement(s) where the strategies disagreed", mismatches);
        std::process::exit(1);
    }
}

/// A query shape to time: the path plus a short label.
struct Workload {
    label: String,
    path: TransitivePath,
}

fn workloads(edges: Arc<dyn Subtree>) -> Vec<Workload> {
    let x = || TransitivePathSide::free(Variable::new("x"), 0);
    let y = || TransitivePathSide::free(Variable::new("y"), 1);
    let mut out = Vec::new();

    for bound in [
        DistanceBound::between(1, 2),
        DistanceBound::between(1, 5),
        DistanceBound::one_or_more(),
    ] {
        out.push(Workload {
            label: format!("?x p{} ?y", bound),
            path: TransitivePath::new(Arc::clone(&edges), x(), y(), bound),
        });
    }

    out.push(Workload {
        label: "0 p* ?y".to_string(),
        path: TransitivePath::new(
            Arc::clone(&edges),
            TransitivePathSide::fixed(0, 0),
            y(),
            DistanceBound::zero_or_more(),
        ),
    });

    // Join pushdown: ten candidate start nodes from a VALUES block.
    let candidates = IdTable::from_rows(1, (0..10u64).map(|i| [i * 7]));
    let values: Arc<dyn Subtree> = Arc::new(
        MaterializedSubtree::new(candidates, [(Variable::new("x"), 0)].into_iter().collect())
            .with_label("VALUES"),
    );
    let free = TransitivePath::new(Arc::clone(&edges), x(), y(), DistanceBound::one_or_more());
    if let Ok(bound) = free.bind_left_side(values, 0) {
        out.push(Workload {
            label: "VALUES ?x . ?x p+ ?y".to_string(),
            path: bound,
        });
    }
    out
}

/// Returns the number of workloads where the strategies disagreed.
fn run_benchmark(
    name: &str,
    generator: fn(u64) -> Vec<(NodeId, NodeId)>,
    node_count: u64,
    json: bool,
) -> usize {
    let t = Instant::now();
    let edges = generator(node_count);
    let gen_time = t.elapsed();
    let table = IdTable::from_edges(edges.iter().copied());
    let edge_count = table.num_rows();
    if !json {
        println!("--- {} ---", name);
        println!(
            "Generated in {:.2}s: {} nodes, {} edges, ~{:.1}MB",
            gen_time.as_secs_f64(),
            node_count,
            edge_count,
            table.memory_usage() as f64 / 1_048_576.0
        );
        println!();
        println!("{:<24} {:>10} {:>12} {:>12}", "query", "rows", "matrix", "search");
        println!("{:-<24} {:->10} {:->12} {:->12}", "", "", "", "");
    }

    let columns = [(Variable::new("s"), 0), (Variable::new("o"), 1)].into_iter().collect();
    let subtree: Arc<dyn Subtree> =
        Arc::new(MaterializedSubtree::new(table, columns).with_label(name));

    let mut mismatches = 0;
    for workload in workloads(subtree) {
        let matrix = measure(&workload.path, true);
        let search = measure(&workload.path, false);

        let agree = match (&matrix, &search) {
            (Ok((a, _)), Ok((b, _))) => a == b,
            _ => false,
        };
        if !agree {
            mismatches += 1;
        }

        let rows = matrix.as_ref().map(|(r, _)| r.len()).unwrap_or(0);
        let ms = |m: &Result<(Vec<Vec<NodeId>>, f64), String>| match m {
            Ok((_, ms)) => format!("{:.1}ms", ms),
            Err(e) => e.clone(),
        };

        if json {
            let record = serde_json::json!({
                "generator": name,
                "nodes": node_count,
                "edges": edge_count,
                "query": workload.label,
                "rows": rows,
                "matrix": ms(&matrix),
                "search": ms(&search),
                "agree": agree,
            });
            println!("{}", record);
        } else {
            println!(
                "{:<24} {:>10} {:>12} {:>12}{}",
                workload.label,
                rows,
                ms(&matrix),
                ms(&search),
                if agree { "" } else { "  MISMATCH" }
            );
        }
    }
    if !json {
        println!();
    }
    mismatches
}

/// Evaluate once with the given strategy; sorted rows and elapsed milliseconds.
fn measure(path: &TransitivePath, use_matrix: bool) -> Result<(Vec<Vec<NodeId>>, f64), String> {
    let params = RuntimeParameters {
        use_matrix_transitive_path: use_matrix,
        ..RuntimeParameters::current()
    };
    let ctx = ExecutionContext::with_parameters(params);
    let t = Instant::now();
    let table = path.compute_result(&ctx).map_err(|e| {
        tracing::warn!(error = %e, "evaluation failed");
        "error".to_string()
    })?;
    let elapsed = t.elapsed().as_secs_f64() * 1000.0;
    let mut rows: Vec<Vec<NodeId>> = table.rows().map(|r| r.to_vec()).collect();
    rows.sort_unstable();
    Ok((rows, elapsed))
}

// ---------------------------------------------------------------------------
// Edge-list generators, seeded so every run sees the same relation
// ---------------------------------------------------------------------------

/// Seeded linear congruential generator; every run of a generator emits the
/// same edge list.
struct EdgeRng {
    state: u64,
}

impl EdgeRng {
    const MULTIPLIER: u64 = 6364136223846793005;

    fn seeded(seed: u64) -> Self {
        Self { state: seed }
    }

    fn step(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(Self::MULTIPLIER).wrapping_add(1);
        self.state
    }

    /// Uniform in `0..bound`.
    fn below(&mut self, bound: u64) -> u64 {
        (self.step() >> 33) % bound
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.step() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Branching tree: each node gets three children, edges point away from the
/// root. Long acyclic paths; unbounded closures converge after log depth.
fn gen_tree(node_count: u64) -> Vec<(NodeId, NodeId)> {
    let branching = 3u64;
    let mut edges = Vec::with_capacity(node_count as usize);
    let mut next_id: u64 = 1;
    let mut frontier: Vec<u64> = vec![0];

    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * branching as usize);
        for &parent in &frontier {
            for _ in 0..branching {
                if next_id >= node_count {
                    break;
                }
                edges.push((parent, next_id));
                next_frontier.push(next_id);
                next_id += 1;
            }
        }
        frontier = next_frontier;
    }
    edges
}

/// Scale-free graph from preferential attachment. Each new node links to
/// endpoints drawn from the list of all edge endpoints so far, which favours
/// hubs in proportion to their degree. A few hubs dominate the closure.
fn gen_scale_free(node_count: u64) -> Vec<(NodeId, NodeId)> {
    let edges_per_node = 3u64;
    let mut rng = EdgeRng::seeded(12345);
    let mut edges = Vec::with_capacity((node_count * edges_per_node) as usize);
    let mut endpoints: Vec<u64> = Vec::with_capacity((node_count * edges_per_node * 2) as usize);

    let seed = 5u64.min(node_count);
    for i in 0..seed {
        for j in (i + 1)..seed {
            edges.push((i, j));
            endpoints.push(i);
            endpoints.push(j);
        }
    }

    for new_node in seed..node_count {
        let attach = edges_per_node.min(new_node);
        for _ in 0..attach {
            if endpoints.is_empty() {
                break;
            }
            let target = endpoints[rng.below(endpoints.len() as u64) as usize];
            if target != new_node {
                edges.push((new_node, target));
                endpoints.push(new_node);
                endpoints.push(target);
            }
        }
    }
    edges
}

/// Small-world (Watts-Strogatz): directed ring lattice + random rewiring.
/// Every node lies on a cycle, so unbounded closures are dense.
fn gen_small_world(node_count: u64) -> Vec<(NodeId, NodeId)> {
    let k = 3u64;
    let p = 0.05f64;
    let mut rng = EdgeRng::seeded(67890);
    let mut edges = Vec::with_capacity((node_count * k) as usize);

    for i in 0..node_count {
        for j in 1..=k {
            let neighbor = (i + j) % node_count;
            if rng.unit() < p {
                let rewired = rng.below(node_count);
                edges.push((i, if rewired != i { rewired } else { neighbor }));
            } else {
                edges.push((i, neighbor));
            }
        }
    }
    edges
}

/// Erdos-Renyi: uniform random edges, about two per node.
fn gen_random(node_count: u64) -> Vec<(NodeId, NodeId)> {
    let target_edges = node_count * 2;
    let mut rng = EdgeRng::seeded(54321);
    let mut edges = Vec::with_capacity(target_edges as usize);

    for _ in 0..target_edges {
        let from = rng.below(node_count);
        let to = rng.below(node_count);
        if from != to {
            edges.push((from, to));
        }
    }
    edges
}

/// Aggregation growth in the style of diffusion-limited aggregation.
///
/// Each new node attaches to a recent "surface" node, with occasional
/// long-range jumps that create shortcuts.
fn gen_dla(node_count: u64) -> Vec<(NodeId, NodeId)> {
    let mut rng = EdgeRng::seeded(77777);
    let mut edges = Vec::with_capacity((node_count * 2) as usize);
    let mut surface: VecDeque<u64> = VecDeque::with_capacity(1001);
    surface.push_back(0);
    let surface_max = 1000usize;

    for new_node in 1..node_count {
        let attach_to = surface[rng.below(surface.len() as u64) as usize];
        edges.push((new_node, attach_to));

        // 10% chance of a second connection
        if rng.below(10) == 0 && new_node > 1 {
            let other = rng.below(new_node);
            if other != attach_to {
                edges.push((new_node, other));
            }
        }

        surface.push_back(new_node);
        if surface.len() > surface_max {
            surface.pop_front();
        }
    }
    edges
}
