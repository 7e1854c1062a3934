//! Graph layout algorithms
//!
//! A layout maps vertex row indices to raw 2D positions. Implementations
//! are not required to place every vertex (spring skips isolated ones); the
//! aggregator substitutes a placeholder so that every vertex row ends up
//! with a position. Normalization also happens in the aggregator, so
//! layouts are free to use whatever scale is convenient.

use std::collections::HashMap;
use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::DiGraph;

pub type Positions = HashMap<usize, (f64, f64)>;

pub trait LayoutAlgorithm {
    fn name(&self) -> &'static str;

    /// Deterministic layouts may have their results reused across calls;
    /// stochastic ones produce a fresh layout per invocation.
    fn is_deterministic(&self) -> bool;

    fn compute(&mut self, graph: &DiGraph) -> Positions;
}

/// The closed set of layout names offered to clients
pub const ALGORITHMS: [&str; 6] = ["circular", "shell", "spiral", "layered", "random", "spring"];

/// Look up a layout algorithm by name
pub fn by_name(name: &str) -> Option<Box<dyn LayoutAlgorithm>> {
    match name {
        "circular" => Some(Box::new(Circular)),
        "shell" => Some(Box::new(Shell)),
        "spiral" => Some(Box::new(Spiral)),
        "layered" => Some(Box::new(Layered)),
        "random" => Some(Box::new(Random::new())),
        "spring" => Some(Box::new(Spring::new())),
        _ => None,
    }
}

/// The layout used when none was chosen yet: layered placement for forests
/// (tree-shaped colonies read top-down), spring otherwise.
pub fn default_for(graph: &DiGraph) -> &'static str {
    if graph.edge_count() > 0 && graph.is_forest() {
        "layered"
    } else {
        "spring"
    }
}

/// All vertices evenly spaced on a unit circle
pub struct Circular;

impl LayoutAlgorithm for Circular {
    fn name(&self) -> &'static str {
        "circular"
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn compute(&mut self, graph: &DiGraph) -> Positions {
        let n = graph.vertex_count();
        (0..n)
            .map(|v| {
                let angle = 2.0 * PI * v as f64 / n.max(1) as f64;
                (v, (angle.cos(), angle.sin()))
            })
            .collect()
    }
}

/// Concentric circles by breadth-first distance from the roots
pub struct Shell;

impl LayoutAlgorithm for Shell {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn compute(&mut self, graph: &DiGraph) -> Positions {
        let depths = bfs_depths(graph);
        let max_depth = depths.iter().copied().max().unwrap_or(0);

        let mut shells: Vec<Vec<usize>> = vec![Vec::new(); max_depth + 1];
        for (v, &d) in depths.iter().enumerate() {
            shells[d].push(v);
        }

        let mut positions = Positions::new();
        for (depth, members) in shells.iter().enumerate() {
            let radius = depth as f64 + 1.0;
            for (i, &v) in members.iter().enumerate() {
                let angle = 2.0 * PI * i as f64 / members.len().max(1) as f64;
                positions.insert(v, (radius * angle.cos(), radius * angle.sin()));
            }
        }
        positions
    }
}

/// Archimedean spiral in vertex-index order
pub struct Spiral;

impl LayoutAlgorithm for Spiral {
    fn name(&self) -> &'static str {
        "spiral"
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn compute(&mut self, graph: &DiGraph) -> Positions {
        let n = graph.vertex_count();
        (0..n)
            .map(|v| {
                let t = (v as f64 / n.max(1) as f64) * 3.0 * 2.0 * PI;
                let r = 0.5 + t / (2.0 * PI);
                (v, (r * t.cos(), r * t.sin()))
            })
            .collect()
    }
}

/// Tree-style placement: depth below the roots on the y axis, position
/// within the depth level on the x axis
pub struct Layered;

impl LayoutAlgorithm for Layered {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn compute(&mut self, graph: &DiGraph) -> Positions {
        let depths = bfs_depths(graph);
        let mut level_width = vec![0usize; depths.iter().copied().max().unwrap_or(0) + 1];

        let mut positions = Positions::new();
        for (v, &d) in depths.iter().enumerate() {
            positions.insert(v, (level_width[d] as f64, -(d as f64)));
            level_width[d] += 1;
        }
        positions
    }
}

/// Uniformly random positions in the unit square
pub struct Random {
    rng: StdRng,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl LayoutAlgorithm for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn is_deterministic(&self) -> bool {
        false
    }

    fn compute(&mut self, graph: &DiGraph) -> Positions {
        (0..graph.vertex_count())
            .map(|v| (v, (self.rng.gen_range(0.0..1.0), self.rng.gen_range(0.0..1.0))))
            .collect()
    }
}

/// Fruchterman-Reingold force simulation. Isolated vertices are skipped:
/// without an attractive force they drift arbitrarily far, so the
/// aggregator's placeholder handles them instead.
pub struct Spring {
    rng: StdRng,
    iterations: usize,
}

impl Spring {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            iterations: 50,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            iterations: 50,
        }
    }
}

impl LayoutAlgorithm for Spring {
    fn name(&self) -> &'static str {
        "spring"
    }

    fn is_deterministic(&self) -> bool {
        false
    }

    fn compute(&mut self, graph: &DiGraph) -> Positions {
        let vertices: Vec<usize> = (0..graph.vertex_count())
            .filter(|&v| !graph.is_isolated(v))
            .collect();
        let n = vertices.len();
        if n == 0 {
            return Positions::new();
        }

        let slot: HashMap<usize, usize> =
            vertices.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let mut pos: Vec<(f64, f64)> = (0..n)
            .map(|_| (self.rng.gen_range(0.0..1.0), self.rng.gen_range(0.0..1.0)))
            .collect();

        let k = (1.0 / n as f64).sqrt();
        let mut temperature = 0.1;
        let cooling = temperature / (self.iterations as f64 + 1.0);

        for _ in 0..self.iterations {
            let mut disp = vec![(0.0f64, 0.0f64); n];

            // repulsion between every pair
            for i in 0..n {
                for j in (i + 1)..n {
                    let dx = pos[i].0 - pos[j].0;
                    let dy = pos[i].1 - pos[j].1;
                    let dist = (dx * dx + dy * dy).sqrt().max(1e-9);
                    let force = k * k / dist;
                    let (fx, fy) = (dx / dist * force, dy / dist * force);
                    disp[i].0 += fx;
                    disp[i].1 += fy;
                    disp[j].0 -= fx;
                    disp[j].1 -= fy;
                }
            }

            // attraction along edges
            for &(s, t) in graph.edges() {
                if s == t {
                    continue;
                }
                let (i, j) = (slot[&s], slot[&t]);
                let dx = pos[i].0 - pos[j].0;
                let dy = pos[i].1 - pos[j].1;
                let dist = (dx * dx + dy * dy).sqrt().max(1e-9);
                let force = dist * dist / k;
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                disp[i].0 -= fx;
                disp[i].1 -= fy;
                disp[j].0 += fx;
                disp[j].1 += fy;
            }

            for i in 0..n {
                let (dx, dy) = disp[i];
                let len = (dx * dx + dy * dy).sqrt().max(1e-9);
                let step = len.min(temperature);
                pos[i].0 += dx / len * step;
                pos[i].1 += dy / len * step;
            }
            temperature -= cooling;
        }

        vertices.into_iter().map(|v| (v, pos[slot[&v]])).collect()
    }
}

/// Breadth-first depth of every vertex. Traversal starts at the roots and
/// restarts at unvisited vertices, so every vertex gets a depth.
fn bfs_depths(graph: &DiGraph) -> Vec<usize> {
    let n = graph.vertex_count();
    let mut depths = vec![usize::MAX; n];
    let mut queue = std::collections::VecDeque::new();

    for root in graph.roots() {
        if depths[root] == usize::MAX {
            depths[root] = 0;
            queue.push_back(root);
            drain_bfs(graph, &mut depths, &mut queue);
        }
    }
    for v in 0..n {
        if depths[v] == usize::MAX {
            depths[v] = 0;
            queue.push_back(v);
            drain_bfs(graph, &mut depths, &mut queue);
        }
    }
    depths
}

fn drain_bfs(
    graph: &DiGraph,
    depths: &mut [usize],
    queue: &mut std::collections::VecDeque<usize>,
) {
    while let Some(v) = queue.pop_front() {
        for &next in graph.neighbors(v) {
            if depths[next] == usize::MAX {
                depths[next] = depths[v] + 1;
                queue.push_back(next);
            }
        }
    }
}
