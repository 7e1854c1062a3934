//! Graph view
//!
//! Lays out the colony graph. The edge table names the connectivity through
//! a source and a target column of row indices; the view builds a directed
//! graph from them, computes 2D positions with the chosen layout algorithm
//! and writes the normalized positions, the per-edge polylines and the
//! arrow fields back into the tables.
//!
//! Layout is the expensive step, so it only runs when the graph structure
//! actually changed or the user explicitly asks for a new one.

use std::collections::HashMap;

use log::debug;
use polars::prelude::*;

use crate::constants::graph as columns;
use crate::data::columns::integral_columns;
use crate::error::{ReefError, Result};
use crate::graph::layout::{self, LayoutAlgorithm};
use crate::graph::DiGraph;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

/// Conventional source/target column name pairs, probed in order
const NAME_PAIRS: [(&str, &str); 3] = [
    ("source", "target"),
    ("start", "end"),
    ("startnode.id", "endnode.id"),
];

/// Detect the source and target columns among the candidates by probing the
/// conventional name pairs under every observed column prefix,
/// case-insensitively. Returns the original column names, or `None` rather
/// than a wrong guess.
pub fn detect_source_target(candidates: &[String]) -> Option<(String, String)> {
    let by_lowercase: HashMap<String, &String> = candidates
        .iter()
        .map(|c| (c.to_lowercase(), c))
        .collect();

    let mut prefixes: Vec<Option<String>> = Vec::new();
    for candidate in candidates {
        let prefix = candidate
            .to_lowercase()
            .rsplit_once(':')
            .map(|(p, _)| p.to_string());
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }

    for prefix in &prefixes {
        for (source, target) in NAME_PAIRS {
            let key = |name: &str| match prefix {
                Some(p) => format!("{}:{}", p, name),
                None => name.to_string(),
            };
            if let (Some(s), Some(t)) = (by_lowercase.get(&key(source)), by_lowercase.get(&key(target)))
            {
                return Some(((*s).clone(), (*t).clone()));
            }
        }
    }
    None
}

pub struct GraphView {
    pub source_column: Option<String>,
    pub target_column: Option<String>,
    pub layout_name: Option<String>,
    /// Columns currently offered by the source/target menus
    pub column_options: Vec<String>,

    graph: Option<DiGraph>,
    /// Normalized position per vertex row, valid for the current graph
    positions: Vec<(f64, f64)>,
}

impl GraphView {
    pub fn new() -> Self {
        Self {
            source_column: None,
            target_column: None,
            layout_name: None,
            column_options: Vec::new(),
            graph: None,
            positions: Vec::new(),
        }
    }

    pub fn positions(&self) -> &[(f64, f64)] {
        &self.positions
    }

    /// Explicit user request for a fresh layout (new seed for stochastic
    /// algorithms). Patches the derived columns straight into the sinks;
    /// only valid while idle.
    pub fn request_layout(&mut self, data: &mut SessionData) -> Result<()> {
        if self.graph.is_none() {
            return Ok(());
        }
        self.update_layout(data)?;
        self.push_to_sinks(data)
    }

    fn rebuild_graph(&mut self, data: &SessionData) -> Result<bool> {
        let (Some(source), Some(target)) = (&self.source_column, &self.target_column) else {
            return Err(ReefError::DataInconsistency(
                "could not detect the source and target columns of the edges".to_string(),
            ));
        };

        let sources = data.edges.column_as_indices(source)?;
        let targets = data.edges.column_as_indices(target)?;
        let graph = DiGraph::from_edge_list(data.vertices.height(), &sources, &targets)?;

        let changed = match &self.graph {
            Some(previous) => !previous.same_structure(&graph),
            None => true,
        };
        self.graph = Some(graph);
        Ok(changed)
    }

    #[profiling::function]
    fn update_layout(&mut self, data: &mut SessionData) -> Result<()> {
        let graph = self.graph.as_ref().expect("layout without graph");

        let name = self
            .layout_name
            .as_deref()
            .unwrap_or_else(|| layout::default_for(graph));
        let mut algorithm: Box<dyn LayoutAlgorithm> = layout::by_name(name).ok_or_else(|| {
            ReefError::Config(format!("unknown layout algorithm '{}'", name))
        })?;

        let raw = algorithm.compute(graph);

        // Every vertex row needs a position; vertices the algorithm did not
        // place get a fixed placeholder.
        let mut positions: Vec<(f64, f64)> = (0..graph.vertex_count())
            .map(|v| raw.get(&v).copied().unwrap_or(columns::PLACEHOLDER_POSITION))
            .collect();
        normalize_positions(&mut positions);
        self.positions = positions;

        self.write_columns(data)
    }

    /// Write positions, polylines and arrow fields into the tables
    fn write_columns(&self, data: &mut SessionData) -> Result<()> {
        let xs: Vec<f64> = self.positions.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = self.positions.iter().map(|p| p.1).collect();
        data.vertices
            .set_column(Series::new(columns::VERTEX_X.into(), xs))?;
        data.vertices
            .set_column(Series::new(columns::VERTEX_Y.into(), ys))?;

        let graph = self.graph.as_ref().expect("columns without graph");
        let nedges = graph.edge_count();

        let mut line_xs: Vec<Series> = Vec::with_capacity(nedges);
        let mut line_ys: Vec<Series> = Vec::with_capacity(nedges);
        let mut x0 = Vec::with_capacity(nedges);
        let mut y0 = Vec::with_capacity(nedges);
        let mut x1 = Vec::with_capacity(nedges);
        let mut y1 = Vec::with_capacity(nedges);
        let mut angle = Vec::with_capacity(nedges);

        for &(s, t) in graph.edges() {
            let (sx, sy) = self.positions[s];
            let (tx, ty) = self.positions[t];
            line_xs.push(Series::new("".into(), &[sx, tx]));
            line_ys.push(Series::new("".into(), &[sy, ty]));
            x0.push(sx);
            y0.push(sy);
            x1.push(tx);
            y1.push(ty);
            angle.push((ty - sy).atan2(tx - sx) + columns::ARROW_HEAD_ANGLE);
        }

        data.edges
            .set_column(Series::new(columns::EDGE_XS.into(), line_xs))?;
        data.edges
            .set_column(Series::new(columns::EDGE_YS.into(), line_ys))?;
        data.edges
            .set_column(Series::new(columns::ARROW_X0.into(), x0))?;
        data.edges
            .set_column(Series::new(columns::ARROW_Y0.into(), y0))?;
        data.edges
            .set_column(Series::new(columns::ARROW_X1.into(), x1))?;
        data.edges
            .set_column(Series::new(columns::ARROW_Y1.into(), y1))?;
        data.edges
            .set_column(Series::new(columns::ARROW_ANGLE.into(), angle))?;
        Ok(())
    }

    fn push_to_sinks(&self, data: &mut SessionData) -> Result<()> {
        let vertex_epoch = data.vertices.epoch();
        for name in [columns::VERTEX_X, columns::VERTEX_Y] {
            data.cds
                .patch_column(vertex_epoch, data.vertices.series(name)?)?;
        }
        let edge_epoch = data.edges.epoch();
        for name in [
            columns::EDGE_XS,
            columns::EDGE_YS,
            columns::ARROW_X0,
            columns::ARROW_Y0,
            columns::ARROW_X1,
            columns::ARROW_Y1,
            columns::ARROW_ANGLE,
        ] {
            data.cds_edges
                .patch_column(edge_epoch, data.edges.series(name)?)?;
        }
        Ok(())
    }
}

/// Shift to zero mean and unit standard deviation per axis. A zero-variance
/// axis divides by 1.0, leaving it centered.
fn normalize_positions(positions: &mut [(f64, f64)]) {
    let n = positions.len();
    if n == 0 {
        return;
    }

    let mean_x = positions.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = positions.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let var_x = positions.iter().map(|p| (p.0 - mean_x).powi(2)).sum::<f64>() / n as f64;
    let var_y = positions.iter().map(|p| (p.1 - mean_y).powi(2)).sum::<f64>() / n as f64;
    let std_x = if var_x > 0.0 { var_x.sqrt() } else { 1.0 };
    let std_y = if var_y > 0.0 { var_y.sqrt() } else { 1.0 };

    for p in positions.iter_mut() {
        p.0 = (p.0 - mean_x) / std_x;
        p.1 = (p.1 - mean_y) / std_y;
    }
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for GraphView {
    fn kind(&self) -> ViewKind {
        ViewKind::Graph
    }

    fn reload_df(&mut self, data: &mut SessionData) -> Result<()> {
        if data.edges.height() == 0 {
            self.graph = None;
            self.positions.clear();
            return Ok(());
        }

        self.column_options = integral_columns(&data.edges);

        // Keep the chosen columns if they survived the reload, otherwise
        // fall back to auto-detection.
        let chosen_valid = match (&self.source_column, &self.target_column) {
            (Some(s), Some(t)) => {
                self.column_options.contains(s) && self.column_options.contains(t)
            }
            _ => false,
        };
        if !chosen_valid {
            match detect_source_target(&self.column_options) {
                Some((source, target)) => {
                    self.source_column = Some(source);
                    self.target_column = Some(target);
                }
                None => {
                    self.source_column = None;
                    self.target_column = None;
                }
            }
        }

        let changed = self.rebuild_graph(data)?;

        // First reload: pick a default algorithm for this graph shape.
        let graph = self.graph.as_ref().expect("graph was just rebuilt");
        let layout_valid = self
            .layout_name
            .as_deref()
            .map(|name| layout::ALGORITHMS.contains(&name))
            .unwrap_or(false);
        if !layout_valid {
            self.layout_name = Some(layout::default_for(graph).to_string());
        }

        // Structure unchanged: the previous layout columns are still valid,
        // re-add them so the sink replace carries them.
        if changed {
            self.update_layout(data)?;
        } else {
            debug!("graph structure unchanged, keeping previous layout");
            self.write_columns(data)?;
        }
        Ok(())
    }

    fn reload_cds(&mut self, _data: &mut SessionData) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests_support::data_with;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detect_bare_and_prefixed_pairs() {
        assert_eq!(
            detect_source_target(&strings(&["weight", "source", "target"])),
            Some(("source".to_string(), "target".to_string()))
        );
        assert_eq!(
            detect_source_target(&strings(&["input:start", "input:end"])),
            Some(("input:start".to_string(), "input:end".to_string()))
        );
        // case preserved from the original names
        assert_eq!(
            detect_source_target(&strings(&["edges:Source", "edges:TARGET"])),
            Some(("edges:Source".to_string(), "edges:TARGET".to_string()))
        );
        assert_eq!(
            detect_source_target(&strings(&["a:startnode.id", "a:endnode.id"])),
            Some(("a:startnode.id".to_string(), "a:endnode.id".to_string()))
        );
    }

    #[test]
    fn test_detect_requires_both_columns() {
        assert_eq!(detect_source_target(&strings(&["source", "weight"])), None);
        assert_eq!(detect_source_target(&strings(&["a:source", "b:target"])), None);
        assert_eq!(detect_source_target(&[]), None);
    }

    fn graph_data() -> SessionData {
        // 4 vertices, path 0->1->2, vertex 3 isolated
        data_with(
            DataFrame::new(vec![
                Series::new("volume".into(), &[1.0f64, 2.0, 3.0, 4.0]).into(),
            ])
            .unwrap(),
            DataFrame::new(vec![
                Series::new("source".into(), &[0i64, 1]).into(),
                Series::new("target".into(), &[1i64, 2]).into(),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_every_vertex_gets_a_position() {
        let mut data = graph_data();
        let mut view = GraphView::new();
        view.layout_name = Some("spring".to_string());

        view.reload_df(&mut data).unwrap();

        assert_eq!(view.positions().len(), 4);
        let xs = data.vertices.column_as_f64(columns::VERTEX_X).unwrap();
        let ys = data.vertices.column_as_f64(columns::VERTEX_Y).unwrap();
        assert_eq!(xs.len(), 4);
        assert!(xs.iter().chain(ys.iter()).all(|v| v.is_finite()));
    }

    #[test]
    fn test_edge_columns_written() {
        let mut data = graph_data();
        let mut view = GraphView::new();
        view.layout_name = Some("circular".to_string());
        view.reload_df(&mut data).unwrap();

        for name in [
            columns::EDGE_XS,
            columns::EDGE_YS,
            columns::ARROW_X0,
            columns::ARROW_ANGLE,
        ] {
            assert!(data.edges.has_column(name), "{} missing", name);
        }

        // arrow endpoints match the vertex positions
        let xs = data.vertices.column_as_f64(columns::VERTEX_X).unwrap();
        let x0 = data.edges.column_as_f64(columns::ARROW_X0).unwrap();
        let x1 = data.edges.column_as_f64(columns::ARROW_X1).unwrap();
        assert_eq!(x0, vec![xs[0], xs[1]]);
        assert_eq!(x1, vec![xs[1], xs[2]]);
    }

    #[test]
    fn test_unchanged_structure_skips_layout() {
        let mut data = graph_data();
        let mut view = GraphView::new();
        view.layout_name = Some("random".to_string());

        view.reload_df(&mut data).unwrap();
        let first: Vec<(f64, f64)> = view.positions().to_vec();

        // same edges again: a recompute of the stochastic layout would give
        // different positions, so identical positions prove the skip
        view.reload_df(&mut data).unwrap();
        assert_eq!(view.positions(), first.as_slice());

        // an added edge changes the structure and forces a new layout
        let new_edges = DataFrame::new(vec![
            Series::new("source".into(), &[0i64, 1, 3]).into(),
            Series::new("target".into(), &[1i64, 2, 0]).into(),
        ])
        .unwrap();
        data.edges.replace(new_edges);
        view.reload_df(&mut data).unwrap();
        assert_ne!(view.positions(), first.as_slice());
    }

    #[test]
    fn test_explicit_request_recomputes() {
        let mut data = graph_data();
        let mut view = GraphView::new();
        view.layout_name = Some("random".to_string());
        view.reload_df(&mut data).unwrap();
        let first: Vec<(f64, f64)> = view.positions().to_vec();

        view.request_layout(&mut data).unwrap();
        assert_ne!(view.positions(), first.as_slice());
        assert!(data.cds.data().column(columns::VERTEX_X).is_ok());
    }

    #[test]
    fn test_undetected_columns_abort() {
        let mut data = data_with(
            DataFrame::new(vec![Series::new("volume".into(), &[1.0f64]).into()]).unwrap(),
            DataFrame::new(vec![Series::new("weight".into(), &[1i64]).into()]).unwrap(),
        );
        let mut view = GraphView::new();
        let err = view.reload_df(&mut data).unwrap_err();
        assert!(matches!(err, ReefError::DataInconsistency(_)));
    }

    #[test]
    fn test_normalization_handles_zero_variance() {
        let mut positions = vec![(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)];
        normalize_positions(&mut positions);
        assert!(positions.iter().all(|p| p.0.is_finite() && p.1.is_finite()));
        assert!(positions.iter().map(|p| p.0).sum::<f64>().abs() < 1e-12);

        let std_y = (positions.iter().map(|p| p.1 * p.1).sum::<f64>() / 3.0).sqrt();
        assert!((std_y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_layout_for_forest() {
        let mut data = graph_data();
        let mut view = GraphView::new();
        view.reload_df(&mut data).unwrap();
        assert_eq!(view.layout_name.as_deref(), Some("layered"));
    }
}
