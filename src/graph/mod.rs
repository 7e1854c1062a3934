//! Directed graph built from the edge table
//!
//! The graph exists only to drive layout computation; edge attributes stay
//! in the edge table. Vertices are identified by their row index in the
//! vertex table.

pub mod layout;

use crate::error::{ReefError, Result};

pub struct DiGraph {
    vertex_count: usize,
    edges: Vec<(usize, usize)>,
    /// Undirected adjacency, used by traversal-based layouts
    neighbors: Vec<Vec<usize>>,
}

impl DiGraph {
    /// Build a graph over `vertex_count` vertices from parallel source and
    /// target index columns. Endpoints out of range are a data
    /// inconsistency, not a recoverable state.
    pub fn from_edge_list(
        vertex_count: usize,
        sources: &[usize],
        targets: &[usize],
    ) -> Result<Self> {
        if sources.len() != targets.len() {
            return Err(ReefError::DataInconsistency(format!(
                "source/target column length mismatch: {} vs {}",
                sources.len(),
                targets.len()
            )));
        }

        let mut edges = Vec::with_capacity(sources.len());
        let mut neighbors = vec![Vec::new(); vertex_count];
        for (&s, &t) in sources.iter().zip(targets.iter()) {
            if s >= vertex_count || t >= vertex_count {
                return Err(ReefError::DataInconsistency(format!(
                    "edge ({}, {}) references a vertex outside 0..{}",
                    s, t, vertex_count
                )));
            }
            edges.push((s, t));
            neighbors[s].push(t);
            if s != t {
                neighbors[t].push(s);
            }
        }

        Ok(Self {
            vertex_count,
            edges,
            neighbors,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Undirected neighbors of a vertex
    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.neighbors[vertex]
    }

    pub fn degree(&self, vertex: usize) -> usize {
        self.neighbors[vertex].len()
    }

    pub fn is_isolated(&self, vertex: usize) -> bool {
        self.neighbors[vertex].is_empty()
    }

    /// True when the underlying undirected graph has no cycle. Decides the
    /// default layout (layered for forests, spring otherwise).
    pub fn is_forest(&self) -> bool {
        let mut parent: Vec<usize> = (0..self.vertex_count).collect();

        fn find(parent: &mut [usize], mut v: usize) -> usize {
            while parent[v] != v {
                parent[v] = parent[parent[v]];
                v = parent[v];
            }
            v
        }

        for &(s, t) in &self.edges {
            let rs = find(&mut parent, s);
            let rt = find(&mut parent, t);
            if rs == rt {
                return false;
            }
            parent[rs] = rt;
        }
        true
    }

    /// True when the other graph has the same structure: same vertex count
    /// and the same edge multiset. This is the gate for skipping layout
    /// recomputation; structure-equal graphs never need a new layout.
    pub fn same_structure(&self, other: &DiGraph) -> bool {
        if self.vertex_count != other.vertex_count || self.edges.len() != other.edges.len() {
            return false;
        }
        let mut a = self.edges.clone();
        let mut b = other.edges.clone();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }

    /// Vertices with no incoming edge, in index order. Falls back to vertex
    /// 0 when every vertex has one (cyclic graph).
    pub fn roots(&self) -> Vec<usize> {
        let mut has_incoming = vec![false; self.vertex_count];
        for &(s, t) in &self.edges {
            if s != t {
                has_incoming[t] = true;
            }
        }
        let roots: Vec<usize> = (0..self.vertex_count)
            .filter(|&v| !has_incoming[v] && !self.is_isolated(v))
            .collect();
        if roots.is_empty() && self.vertex_count > 0 {
            vec![0]
        } else {
            roots
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_endpoint() {
        let result = DiGraph::from_edge_list(3, &[0, 1], &[1, 3]);
        assert!(matches!(result, Err(ReefError::DataInconsistency(_))));
    }

    #[test]
    fn test_forest_detection() {
        // path 0-1-2 plus isolated 3
        let g = DiGraph::from_edge_list(4, &[0, 1], &[1, 2]).unwrap();
        assert!(g.is_forest());

        // triangle
        let g = DiGraph::from_edge_list(3, &[0, 1, 2], &[1, 2, 0]).unwrap();
        assert!(!g.is_forest());

        // self loop
        let g = DiGraph::from_edge_list(2, &[0], &[0]).unwrap();
        assert!(!g.is_forest());
    }

    #[test]
    fn test_same_structure_ignores_edge_order() {
        let a = DiGraph::from_edge_list(3, &[0, 1], &[1, 2]).unwrap();
        let b = DiGraph::from_edge_list(3, &[1, 0], &[2, 1]).unwrap();
        assert!(a.same_structure(&b));

        let c = DiGraph::from_edge_list(3, &[0, 2], &[1, 1]).unwrap();
        assert!(!a.same_structure(&c));

        let d = DiGraph::from_edge_list(4, &[0, 1], &[1, 2]).unwrap();
        assert!(!a.same_structure(&d));
    }

    #[test]
    fn test_roots_skip_isolated() {
        let g = DiGraph::from_edge_list(4, &[0, 1], &[1, 2]).unwrap();
        assert_eq!(g.roots(), vec![0]);
        assert!(g.is_isolated(3));
    }
}
