//! Data providers
//!
//! A provider adapts an external data source (CSV spreadsheets, generated
//! test data, an interprocess bridge) to the engine: it yields the vertex
//! and edge tables and accepts selection/colormap writebacks so that
//! external tools stay in sync with the session.

pub mod filesystem;
pub mod random;

use std::sync::{Arc, Mutex};

use polars::prelude::DataFrame;

use crate::error::Result;

/// Listener invoked when the provider's data changed. May be called on an
/// arbitrary thread (a watcher, an IPC reader); the session marshals the
/// notification onto its update thread before touching shared state.
pub type ChangeListener = Box<dyn Fn() + Send>;

/// Thread-safe change signal shared between a provider and its watchers
#[derive(Clone, Default)]
pub struct ChangeSignal {
    listeners: Arc<Mutex<Vec<ChangeListener>>>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, listener: ChangeListener) {
        self.listeners.lock().unwrap().push(listener);
    }

    pub fn emit(&self) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener();
        }
    }
}

pub trait DataProvider: Send {
    /// Refresh the provider's internal state. Emits the change signal
    /// exactly once on success and not at all on failure.
    fn reload(&mut self) -> Result<()>;

    /// Snapshot of the vertex table after the last successful `reload`
    fn vertices(&self) -> DataFrame;

    /// Snapshot of the edge table after the last successful `reload`
    fn edges(&self) -> DataFrame;

    fn write_vertex_selection(&mut self, indices: &[usize]) -> Result<()>;

    fn write_edge_selection(&mut self, indices: &[usize]) -> Result<()>;

    fn write_vertex_colormap(&mut self, glyphs: &[String]) -> Result<()>;

    fn write_edge_colormap(&mut self, glyphs: &[String]) -> Result<()>;

    /// Register a change listener. Listeners may be invoked on arbitrary
    /// threads.
    fn subscribe(&mut self, listener: ChangeListener);
}
