//! Views
//!
//! A view is one unit of visualization fed by the shared tables and
//! selection. Views own their derived state (axis choices, bins, layouts,
//! embeddings) and re-derive it through two reload hooks:
//!
//! * `reload_df` runs after the tables were replaced and before the render
//!   sinks are refreshed; the view re-adds any derived columns it owns to
//!   the tables here, so the bulk sink replace carries them.
//! * `reload_cds` runs after the sinks were refreshed; the view rebuilds
//!   its local aggregates now that every column exists in both places.
//!
//! Views never replace the tables and never write to the provider; they go
//! through the session for both.

pub mod embedding;
pub mod flower;
pub mod graph;
pub mod histogram;
pub mod map;
pub mod scatter;
pub mod splom;
pub mod statistics;
pub mod table;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::SessionData;

/// The closed set of view kinds. Panels are configured with one of these
/// tags; there is no name-string dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Scatter,
    Splom,
    Graph,
    Histogram,
    Map,
    Table,
    Flower,
    Statistics,
    Embedding,
}

impl ViewKind {
    pub const ALL: [ViewKind; 9] = [
        ViewKind::Scatter,
        ViewKind::Splom,
        ViewKind::Graph,
        ViewKind::Histogram,
        ViewKind::Map,
        ViewKind::Table,
        ViewKind::Flower,
        ViewKind::Statistics,
        ViewKind::Embedding,
    ];

    /// Construct the view for this kind
    pub fn create(self) -> Box<dyn View> {
        match self {
            ViewKind::Scatter => Box::new(scatter::ScatterView::new()),
            ViewKind::Splom => Box::new(splom::SplomView::new()),
            ViewKind::Graph => Box::new(graph::GraphView::new()),
            ViewKind::Histogram => Box::new(histogram::HistogramView::new()),
            ViewKind::Map => Box::new(map::MapView::new()),
            ViewKind::Table => Box::new(table::TableView::new()),
            ViewKind::Flower => Box::new(flower::FlowerView::new()),
            ViewKind::Statistics => Box::new(statistics::StatisticsView::new()),
            ViewKind::Embedding => Box::new(embedding::EmbeddingView::new_pca()),
        }
    }
}

pub trait View {
    fn kind(&self) -> ViewKind;

    /// Re-add view-owned derived columns to the shared tables. Runs before
    /// the render sinks are refreshed.
    fn reload_df(&mut self, data: &mut SessionData) -> Result<()>;

    /// Rebuild view-local aggregates. Runs after the render sinks were
    /// refreshed.
    fn reload_cds(&mut self, data: &mut SessionData) -> Result<()>;

    /// The selection changed while idle
    fn selection_changed(&mut self, data: &SessionData) -> Result<()> {
        let _ = data;
        Ok(())
    }

    /// A factor map was recomputed while idle
    fn factor_map_changed(&mut self, data: &SessionData) -> Result<()> {
        let _ = data;
        Ok(())
    }
}
