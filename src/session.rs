//! Session
//!
//! The session owns the data provider, the two tables, the factor maps and
//! the render sinks, and orchestrates the reload protocol that keeps every
//! derived artifact consistent with the data.
//!
//! All state here lives on one logical update thread. Provider change
//! notifications may arrive on other threads; they are marshaled through an
//! mpsc channel (`SessionHandle`) and handled in `drain`. Nothing else
//! suspends: layout and reduction run synchronously on this thread.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};

use log::{error, info};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::constants::{factor as factor_names, palette, session as defaults};
use crate::data::columns::label_columns;
use crate::data::Table;
use crate::error::{ReefError, Result};
use crate::factor::{FactorMap, PaletteMode};
use crate::provider::DataProvider;
use crate::sink::ColumnSource;
use crate::view::graph::detect_source_target;
use crate::view::{View, ViewKind};

/// Messages marshaled onto the session's update thread
pub enum SessionMsg {
    /// The provider's data changed; possibly signaled from another thread
    DataChanged,
    /// A client asked for a reload
    ReloadRequested,
}

/// Cloneable, thread-safe entry point into the session's update thread
#[derive(Clone)]
pub struct SessionHandle {
    tx: Sender<SessionMsg>,
}

impl SessionHandle {
    pub fn notify_data_changed(&self) {
        let _ = self.tx.send(SessionMsg::DataChanged);
    }

    pub fn request_reload(&self) {
        let _ = self.tx.send(SessionMsg::ReloadRequested);
    }
}

/// Appearance settings mirrored to clients. They survive reloads untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiState {
    pub vertex_size: f64,
    pub vertex_opacity: f64,
    pub edge_width: f64,
    pub edge_opacity: f64,
    pub font_size: u32,
    /// Set when the provider signaled a change that has not been applied
    /// yet (the client's reload button)
    #[serde(skip)]
    pub reload_pending: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            vertex_size: defaults::DEFAULT_VERTEX_SIZE,
            vertex_opacity: defaults::DEFAULT_VERTEX_OPACITY,
            edge_width: defaults::DEFAULT_EDGE_WIDTH,
            edge_opacity: defaults::DEFAULT_EDGE_OPACITY,
            font_size: defaults::DEFAULT_FONT_SIZE,
            reload_pending: false,
        }
    }
}

/// Persistable session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub color_column: Option<String>,
    pub marker_column: Option<String>,
    pub edge_color_column: Option<String>,
    pub left_panel: Option<ViewKind>,
    pub right_panel: Option<ViewKind>,
    pub automatic_reload: bool,
    #[serde(default)]
    pub ui: Option<UiState>,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The shared state views operate on: tables, sinks, factor maps and the
/// column menus. Owned by the session; views receive it through the reload
/// hooks and must not hold on to any part of it.
pub struct SessionData {
    pub vertices: Table,
    pub edges: Table,
    pub cds: ColumnSource,
    pub cds_edges: ColumnSource,
    pub fmap_color: FactorMap,
    pub fmap_marker: FactorMap,
    pub fmap_color_edges: FactorMap,
    /// Columns currently offered by the vertex color/marker menus
    pub vertex_label_columns: Vec<String>,
    /// Columns currently offered by the edge color menu
    pub edge_label_columns: Vec<String>,
    pub ui: UiState,
}

impl SessionData {
    fn new() -> Result<Self> {
        let colors: Vec<String> = palette::COLORS.iter().map(|s| s.to_string()).collect();
        let markers: Vec<String> = palette::MARKERS.iter().map(|s| s.to_string()).collect();

        Ok(Self {
            vertices: Table::empty(),
            edges: Table::empty(),
            cds: ColumnSource::new("vertices"),
            cds_edges: ColumnSource::new("edges"),
            fmap_color: FactorMap::new(
                factor_names::VERTEX_COLOR,
                None,
                colors.clone(),
                PaletteMode::Cycle,
            )?,
            fmap_marker: FactorMap::new(
                factor_names::VERTEX_MARKER,
                None,
                markers,
                PaletteMode::RepeatLast,
            )?,
            fmap_color_edges: FactorMap::new(
                factor_names::EDGE_COLOR,
                None,
                colors,
                PaletteMode::Cycle,
            )?,
            vertex_label_columns: Vec::new(),
            edge_label_columns: Vec::new(),
            ui: UiState::default(),
        })
    }

    /// Recompute the color/marker menus and drop factor-map column choices
    /// that no longer exist (fall back to "no column").
    fn refresh_column_menus(&mut self) {
        self.vertex_label_columns = label_columns(&self.vertices);
        self.edge_label_columns = label_columns(&self.edges);

        for fmap in [&mut self.fmap_color, &mut self.fmap_marker] {
            if let Some(column) = fmap.column_name() {
                if !self.vertex_label_columns.iter().any(|c| c == column) {
                    fmap.set_column_name(None);
                }
            }
        }
        if let Some(column) = self.fmap_color_edges.column_name() {
            if !self.edge_label_columns.iter().any(|c| c == column) {
                self.fmap_color_edges.set_column_name(None);
            }
        }
    }

    fn recompute_factor_maps(&mut self) -> Result<()> {
        self.fmap_color.recompute(&mut self.vertices)?;
        self.fmap_marker.recompute(&mut self.vertices)?;
        self.fmap_color_edges.recompute(&mut self.edges)?;
        Ok(())
    }
}

/// Which panel a view occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Left,
    Right,
}

pub struct Session {
    provider: Box<dyn DataProvider>,
    pub data: SessionData,
    panel_left: Option<Box<dyn View>>,
    panel_right: Option<Box<dyn View>>,

    /// Re-entrancy guard: while true, reload requests are no-ops and no
    /// writeback leaves the session
    reloading: bool,
    /// Our own provider.reload() emits a change notification; the next
    /// DataChanged message is that echo and must not re-trigger a reload
    echo_expected: bool,
    pub automatic_reload: bool,

    rx: Receiver<SessionMsg>,
    tx: Sender<SessionMsg>,
}

impl Session {
    pub fn new(mut provider: Box<dyn DataProvider>) -> Result<Self> {
        let (tx, rx) = channel();

        let handle = SessionHandle { tx: tx.clone() };
        provider.subscribe(Box::new(move || handle.notify_data_changed()));

        Ok(Self {
            provider,
            data: SessionData::new()?,
            panel_left: None,
            panel_right: None,
            reloading: false,
            echo_expected: false,
            automatic_reload: false,
            rx,
            tx,
        })
    }

    /// Thread-safe handle for provider watchers and external clients
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn view(&self, panel: Panel) -> Option<&dyn View> {
        match panel {
            Panel::Left => self.panel_left.as_deref(),
            Panel::Right => self.panel_right.as_deref(),
        }
    }

    /// Install a view into a panel (or clear it with `None`). The new view
    /// runs both reload hooks immediately so it comes up consistent with
    /// the current tables.
    pub fn set_panel(&mut self, panel: Panel, kind: Option<ViewKind>) -> Result<()> {
        let view = match kind {
            Some(kind) => {
                let mut view = kind.create();
                view.reload_df(&mut self.data)?;
                self.data.cds.replace_from(&self.data.vertices);
                self.data.cds_edges.replace_from(&self.data.edges);
                view.reload_cds(&mut self.data)?;
                Some(view)
            }
            None => None,
        };
        match panel {
            Panel::Left => self.panel_left = view,
            Panel::Right => self.panel_right = view,
        }
        Ok(())
    }

    /// Reload the data and bring every derived artifact up to date.
    ///
    /// Idempotent while a reload is in flight. The reloading flag is
    /// released on every path, including errors; a failed reload leaves the
    /// session in its last known-good state.
    pub fn reload(&mut self) -> Result<()> {
        if self.reloading {
            return Ok(());
        }
        self.reloading = true;
        let result = self.reload_inner();
        self.reloading = false;

        match result {
            Ok(()) => {
                self.data.ui.reload_pending = false;

                // Echo the (possibly clamped) selection and the colormaps
                // back out so external tools stay in sync. This must happen
                // after the flag cleared: the echo is not a user selection.
                let selection: Vec<usize> = self.data.cds.selected().to_vec();
                self.provider.write_vertex_selection(&selection)?;
                let selection: Vec<usize> = self.data.cds_edges.selected().to_vec();
                self.provider.write_edge_selection(&selection)?;
                self.provider
                    .write_vertex_colormap(self.data.fmap_color.glyph_column())?;
                self.provider
                    .write_edge_colormap(self.data.fmap_color_edges.glyph_column())?;
                Ok(())
            }
            Err(e) => {
                error!("reload aborted: {}", e.user_message());
                Err(e)
            }
        }
    }

    fn reload_inner(&mut self) -> Result<()> {
        info!("reload ...");

        self.echo_expected = true;
        if let Err(e) = self.provider.reload() {
            // failure emits no change signal, so no echo will arrive
            self.echo_expected = false;
            return Err(e);
        }

        // Validate the new snapshots before touching any session state so
        // that a failure leaves the previous tables fully intact.
        let vertices = self.provider.vertices();
        let edges = self.provider.edges();
        Self::validate_snapshots(&vertices, &edges)?;

        self.data.vertices.replace(vertices);
        self.data.edges.replace(edges);

        self.data.refresh_column_menus();
        self.data.recompute_factor_maps()?;

        // Views put their derived columns back first; the bulk sink
        // replace below would drop anything added later.
        if let Some(view) = self.panel_left.as_mut() {
            view.reload_df(&mut self.data)?;
        }
        if let Some(view) = self.panel_right.as_mut() {
            view.reload_df(&mut self.data)?;
        }

        // One atomic replace per sink, never incremental patches.
        self.data.cds.replace_from(&self.data.vertices);
        self.data.cds_edges.replace_from(&self.data.edges);

        if let Some(view) = self.panel_left.as_mut() {
            view.reload_cds(&mut self.data)?;
        }
        if let Some(view) = self.panel_right.as_mut() {
            view.reload_cds(&mut self.data)?;
        }

        info!(
            "reload complete: {} vertices, {} edges",
            self.data.vertices.height(),
            self.data.edges.height()
        );
        Ok(())
    }

    /// Reject snapshots whose edge endpoints cannot address the vertex
    /// table. Runs on local copies so nothing is partially applied.
    fn validate_snapshots(vertices: &DataFrame, edges: &DataFrame) -> Result<()> {
        if edges.height() == 0 {
            return Ok(());
        }
        let edge_table = Table::new(edges.clone());
        let candidates = crate::data::columns::integral_columns(&edge_table);
        if let Some((source, target)) = detect_source_target(&candidates) {
            let sources = edge_table.column_as_indices(&source)?;
            let targets = edge_table.column_as_indices(&target)?;
            let n = vertices.height();
            for &i in sources.iter().chain(targets.iter()) {
                if i >= n {
                    return Err(ReefError::DataInconsistency(format!(
                        "edge endpoint {} out of range for {} vertices",
                        i, n
                    )));
                }
            }
        }
        Ok(())
    }

    /// The rendering layer changed the vertex selection. Writebacks and
    /// view refreshes are suppressed while reloading; the post-reload echo
    /// carries the final state instead.
    pub fn set_vertex_selection(&mut self, indices: &[usize]) -> Result<()> {
        let changed = self.data.cds.set_selected(indices);
        if self.reloading || !changed {
            return Ok(());
        }

        self.provider
            .write_vertex_selection(self.data.cds.selected())?;
        self.refresh_selection_views()
    }

    /// The rendering layer changed the edge selection
    pub fn set_edge_selection(&mut self, indices: &[usize]) -> Result<()> {
        let changed = self.data.cds_edges.set_selected(indices);
        if self.reloading || !changed {
            return Ok(());
        }

        self.provider
            .write_edge_selection(self.data.cds_edges.selected())?;
        self.refresh_selection_views()
    }

    /// Choose the column driving the vertex color map
    pub fn set_color_column(&mut self, column: Option<String>) -> Result<()> {
        self.data.fmap_color.set_column_name(column);
        self.data.fmap_color.recompute(&mut self.data.vertices)?;
        if self.reloading {
            return Ok(());
        }
        self.data.fmap_color.push(&mut self.data.cds)?;
        self.provider
            .write_vertex_colormap(self.data.fmap_color.glyph_column())?;
        self.refresh_factor_map_views()
    }

    /// Choose the column driving the vertex marker map
    pub fn set_marker_column(&mut self, column: Option<String>) -> Result<()> {
        self.data.fmap_marker.set_column_name(column);
        self.data.fmap_marker.recompute(&mut self.data.vertices)?;
        if self.reloading {
            return Ok(());
        }
        self.data.fmap_marker.push(&mut self.data.cds)?;
        self.refresh_factor_map_views()
    }

    /// Choose the column driving the edge color map
    pub fn set_edge_color_column(&mut self, column: Option<String>) -> Result<()> {
        self.data.fmap_color_edges.set_column_name(column);
        self.data.fmap_color_edges.recompute(&mut self.data.edges)?;
        if self.reloading {
            return Ok(());
        }
        self.data.fmap_color_edges.push(&mut self.data.cds_edges)?;
        self.provider
            .write_edge_colormap(self.data.fmap_color_edges.glyph_column())?;
        self.refresh_factor_map_views()
    }

    fn refresh_selection_views(&mut self) -> Result<()> {
        if let Some(view) = self.panel_left.as_mut() {
            view.selection_changed(&self.data)?;
        }
        if let Some(view) = self.panel_right.as_mut() {
            view.selection_changed(&self.data)?;
        }
        Ok(())
    }

    fn refresh_factor_map_views(&mut self) -> Result<()> {
        if let Some(view) = self.panel_left.as_mut() {
            view.factor_map_changed(&self.data)?;
        }
        if let Some(view) = self.panel_right.as_mut() {
            view.factor_map_changed(&self.data)?;
        }
        Ok(())
    }

    /// Apply a persisted configuration
    pub fn apply_config(&mut self, config: &SessionConfig) -> Result<()> {
        self.automatic_reload = config.automatic_reload;
        if let Some(ui) = &config.ui {
            self.data.ui = ui.clone();
        }
        self.data.fmap_color.set_column_name(config.color_column.clone());
        self.data
            .fmap_marker
            .set_column_name(config.marker_column.clone());
        self.data
            .fmap_color_edges
            .set_column_name(config.edge_color_column.clone());
        self.set_panel(Panel::Left, config.left_panel)?;
        self.set_panel(Panel::Right, config.right_panel)?;
        Ok(())
    }

    /// Snapshot the current configuration
    pub fn current_config(&self) -> SessionConfig {
        SessionConfig {
            color_column: self.data.fmap_color.column_name().map(|s| s.to_string()),
            marker_column: self.data.fmap_marker.column_name().map(|s| s.to_string()),
            edge_color_column: self
                .data
                .fmap_color_edges
                .column_name()
                .map(|s| s.to_string()),
            left_panel: self.panel_left.as_ref().map(|v| v.kind()),
            right_panel: self.panel_right.as_ref().map(|v| v.kind()),
            automatic_reload: self.automatic_reload,
            ui: Some(self.data.ui.clone()),
        }
    }

    /// Process every pending message on the update thread
    pub fn drain(&mut self) -> Result<()> {
        loop {
            match self.rx.try_recv() {
                Ok(msg) => self.handle_msg(msg)?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }

    fn handle_msg(&mut self, msg: SessionMsg) -> Result<()> {
        match msg {
            SessionMsg::DataChanged => {
                if self.echo_expected {
                    // our own reload's notification coming back around
                    self.echo_expected = false;
                    return Ok(());
                }
                self.data.ui.reload_pending = true;
                if self.automatic_reload {
                    self.reload()?;
                }
                Ok(())
            }
            SessionMsg::ReloadRequested => self.reload(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChangeListener, ChangeSignal};
    use polars::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Provider over in-memory frames with call accounting
    struct MockProvider {
        vertices: DataFrame,
        edges: DataFrame,
        fail_reload: bool,
        reload_calls: Arc<AtomicUsize>,
        vertex_selection_writes: Arc<Mutex<Vec<Vec<usize>>>>,
        colormap_writes: Arc<AtomicUsize>,
        signal: ChangeSignal,
    }

    impl MockProvider {
        fn new(vertices: DataFrame, edges: DataFrame) -> Self {
            Self {
                vertices,
                edges,
                fail_reload: false,
                reload_calls: Arc::new(AtomicUsize::new(0)),
                vertex_selection_writes: Arc::new(Mutex::new(Vec::new())),
                colormap_writes: Arc::new(AtomicUsize::new(0)),
                signal: ChangeSignal::new(),
            }
        }
    }

    impl DataProvider for MockProvider {
        fn reload(&mut self) -> crate::error::Result<()> {
            self.reload_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reload {
                return Err(ReefError::DataInconsistency("simulated failure".into()));
            }
            self.signal.emit();
            Ok(())
        }

        fn vertices(&self) -> DataFrame {
            self.vertices.clone()
        }

        fn edges(&self) -> DataFrame {
            self.edges.clone()
        }

        fn write_vertex_selection(&mut self, indices: &[usize]) -> crate::error::Result<()> {
            self.vertex_selection_writes
                .lock()
                .unwrap()
                .push(indices.to_vec());
            Ok(())
        }

        fn write_edge_selection(&mut self, _indices: &[usize]) -> crate::error::Result<()> {
            Ok(())
        }

        fn write_vertex_colormap(&mut self, _glyphs: &[String]) -> crate::error::Result<()> {
            self.colormap_writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn write_edge_colormap(&mut self, _glyphs: &[String]) -> crate::error::Result<()> {
            Ok(())
        }

        fn subscribe(&mut self, listener: ChangeListener) {
            self.signal.connect(listener);
        }
    }

    fn sample_vertices() -> DataFrame {
        DataFrame::new(vec![
            Series::new("volume".into(), &[1.0f64, 2.0, 3.0, 4.0]).into(),
            Series::new("site".into(), &["north", "south", "north", "reef"]).into(),
        ])
        .unwrap()
    }

    fn sample_edges() -> DataFrame {
        DataFrame::new(vec![
            Series::new("source".into(), &[0i64, 1, 2]).into(),
            Series::new("target".into(), &[1i64, 2, 3]).into(),
        ])
        .unwrap()
    }

    fn session_with(provider: MockProvider) -> Session {
        Session::new(Box::new(provider)).unwrap()
    }

    #[test]
    fn test_reload_happy_path() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let selection_writes = Arc::clone(&provider.vertex_selection_writes);
        let mut session = session_with(provider);

        session.reload().unwrap();

        assert_eq!(session.data.vertices.height(), 4);
        assert_eq!(session.data.edges.height(), 3);
        assert_eq!(session.data.cds.height(), 4);
        assert!(session.data.vertices.has_column("reef:color:glyph"));
        assert_eq!(
            session.data.vertex_label_columns,
            vec!["site".to_string()]
        );
        // post-reload echo carries the (empty) selection exactly once
        assert_eq!(selection_writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reload_atomic_on_provider_failure() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let mut session = session_with(provider);
        session.reload().unwrap();
        let epoch = session.data.vertices.epoch();

        let provider = MockProvider {
            fail_reload: true,
            ..MockProvider::new(sample_vertices(), sample_edges())
        };
        let mut failing = session_with(provider);
        failing.reload().unwrap_err();
        assert_eq!(failing.data.vertices.height(), 0, "no partial state");
        assert!(!failing.is_reloading(), "flag released on error");

        // a session that already has data keeps it when a later reload fails
        let vertices = sample_vertices();
        let bad_edges = DataFrame::new(vec![
            Series::new("source".into(), &[0i64]).into(),
            Series::new("target".into(), &[99i64]).into(),
        ])
        .unwrap();
        let provider = MockProvider::new(vertices, bad_edges);
        // swap providers by building a fresh session, then failing reload
        let mut session2 = session_with(provider);
        let err = session2.reload().unwrap_err();
        assert!(matches!(err, ReefError::DataInconsistency(_)));
        assert_eq!(session2.data.vertices.height(), 0);

        // the healthy session's state was untouched throughout
        assert_eq!(session.data.vertices.epoch(), epoch);
    }

    #[test]
    fn test_reentrancy_guard() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let reload_calls = Arc::clone(&provider.reload_calls);
        let mut session = session_with(provider);

        session.reloading = true;
        session.reload().unwrap();
        assert_eq!(reload_calls.load(Ordering::SeqCst), 0, "guard short-circuits");

        session.reloading = false;
        session.reload().unwrap();
        assert_eq!(reload_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_change_echo_does_not_retrigger_reload() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let reload_calls = Arc::clone(&provider.reload_calls);
        let mut session = session_with(provider);
        session.automatic_reload = true;

        session.reload().unwrap();
        assert_eq!(reload_calls.load(Ordering::SeqCst), 1);

        // the provider emitted its signal during reload; draining the echo
        // must not start a second reload
        session.drain().unwrap();
        assert_eq!(reload_calls.load(Ordering::SeqCst), 1);
        assert!(!session.data.ui.reload_pending);
    }

    #[test]
    fn test_external_change_sets_pending_and_autoreloads() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let reload_calls = Arc::clone(&provider.reload_calls);
        let mut session = session_with(provider);

        session.handle().notify_data_changed();
        session.drain().unwrap();
        assert!(session.data.ui.reload_pending);
        assert_eq!(reload_calls.load(Ordering::SeqCst), 0);

        session.automatic_reload = true;
        session.handle().notify_data_changed();
        session.drain().unwrap();
        assert_eq!(reload_calls.load(Ordering::SeqCst), 1);
        assert!(!session.data.ui.reload_pending);
        // consume the echo of that automatic reload
        session.drain().unwrap();
        assert_eq!(reload_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_selection_writeback_suppressed_while_reloading() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let selection_writes = Arc::clone(&provider.vertex_selection_writes);
        let mut session = session_with(provider);
        session.reload().unwrap();
        selection_writes.lock().unwrap().clear();

        session.reloading = true;
        session.set_vertex_selection(&[1, 2]).unwrap();
        assert!(selection_writes.lock().unwrap().is_empty(), "suppressed");
        session.reloading = false;

        // the next reload echoes the restored selection exactly once
        session.reload().unwrap();
        let writes = selection_writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], vec![1, 2]);
    }

    #[test]
    fn test_selection_change_propagates_when_idle() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let selection_writes = Arc::clone(&provider.vertex_selection_writes);
        let mut session = session_with(provider);
        session.reload().unwrap();
        selection_writes.lock().unwrap().clear();

        session.set_vertex_selection(&[3, 0]).unwrap();
        assert_eq!(*selection_writes.lock().unwrap(), vec![vec![0, 3]]);

        // unchanged selection writes nothing
        session.set_vertex_selection(&[0, 3]).unwrap();
        assert_eq!(selection_writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_color_column_update_writes_colormap() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let colormap_writes = Arc::clone(&provider.colormap_writes);
        let mut session = session_with(provider);
        session.reload().unwrap();
        let after_reload = colormap_writes.load(Ordering::SeqCst);

        session.set_color_column(Some("site".to_string())).unwrap();
        assert_eq!(colormap_writes.load(Ordering::SeqCst), after_reload + 1);
        assert_eq!(session.data.fmap_color.factors().len(), 3);
        assert!(
            session
                .data
                .cds
                .data()
                .column("reef:color:glyph")
                .is_ok()
        );
    }

    #[test]
    fn test_missing_column_falls_back_to_none() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let mut session = session_with(provider);
        session
            .data
            .fmap_color
            .set_column_name(Some("gone".to_string()));
        session.reload().unwrap();
        assert_eq!(session.data.fmap_color.column_name(), None);
        assert_eq!(session.data.fmap_color.factors(), vec!["None"]);
    }

    #[test]
    fn test_config_round_trip() {
        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let mut session = session_with(provider);
        session.reload().unwrap();
        session.set_color_column(Some("site".to_string())).unwrap();
        session.set_panel(Panel::Left, Some(ViewKind::Histogram)).unwrap();

        let json = session.current_config().to_json().unwrap();
        let config = SessionConfig::from_json(&json).unwrap();
        assert_eq!(config.color_column.as_deref(), Some("site"));
        assert_eq!(config.left_panel, Some(ViewKind::Histogram));

        let provider = MockProvider::new(sample_vertices(), sample_edges());
        let mut restored = session_with(provider);
        restored.apply_config(&config).unwrap();
        restored.reload().unwrap();
        assert_eq!(restored.data.fmap_color.column_name(), Some("site"));
        assert!(restored.view(Panel::Left).is_some());
    }
}
