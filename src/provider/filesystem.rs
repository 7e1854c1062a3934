//! Filesystem data provider
//!
//! Merges CSV spreadsheets from the local filesystem into the vertex and
//! edge tables. Each spreadsheet is mounted under a column prefix so that
//! columns from different files cannot collide. The current selection and
//! colormap are persisted back to disk where external tools pick them up.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use polars::prelude::*;

use crate::error::{ReefError, Result};
use crate::provider::{ChangeListener, ChangeSignal, DataProvider};

struct CsvSource {
    path: PathBuf,
    prefix: String,
}

pub struct FilesystemProvider {
    vertex_files: Vec<CsvSource>,
    edge_files: Vec<CsvSource>,

    /// Output path for the persisted vertex selection
    pub vertex_selection_path: Option<PathBuf>,
    /// Output path for the persisted edge selection
    pub edge_selection_path: Option<PathBuf>,
    /// Output path for the persisted vertex colormap
    pub vertex_colormap_path: Option<PathBuf>,
    /// Output path for the persisted edge colormap
    pub edge_colormap_path: Option<PathBuf>,

    vertices: DataFrame,
    edges: DataFrame,
    signal: ChangeSignal,
}

impl FilesystemProvider {
    pub fn new() -> Self {
        Self {
            vertex_files: Vec::new(),
            edge_files: Vec::new(),
            vertex_selection_path: None,
            edge_selection_path: None,
            vertex_colormap_path: None,
            edge_colormap_path: None,
            vertices: DataFrame::empty(),
            edges: DataFrame::empty(),
            signal: ChangeSignal::new(),
        }
    }

    /// Register a vertex spreadsheet. The prefix defaults to the file stem.
    pub fn add_vertex_csv(&mut self, path: &Path, prefix: Option<&str>) {
        self.vertex_files.push(Self::source(path, prefix));
    }

    /// Register an edge spreadsheet. The prefix defaults to the file stem.
    pub fn add_edge_csv(&mut self, path: &Path, prefix: Option<&str>) {
        self.edge_files.push(Self::source(path, prefix));
    }

    fn source(path: &Path, prefix: Option<&str>) -> CsvSource {
        let prefix = prefix
            .map(|p| p.to_string())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_default();
        CsvSource {
            path: path.to_path_buf(),
            prefix,
        }
    }

    fn read_prefixed(source: &CsvSource) -> Result<DataFrame> {
        let mut df = LazyCsvReader::new(&source.path)
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .with_try_parse_dates(true)
            .finish()?
            .collect()?;

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for name in names {
            df.rename(&name, format!("{}:{}", source.prefix, name).into())?;
        }
        Ok(df)
    }

    /// Merge spreadsheets horizontally. All files contributing to one table
    /// must describe the same rows, so differing heights abort the reload.
    fn merge(sources: &[CsvSource], what: &str) -> Result<DataFrame> {
        let mut merged: Option<DataFrame> = None;
        for source in sources {
            let df = Self::read_prefixed(source)?;
            merged = Some(match merged {
                None => df,
                Some(acc) => {
                    if acc.height() != df.height() {
                        return Err(ReefError::DataInconsistency(format!(
                            "{} spreadsheet '{}' has {} rows, expected {}",
                            what,
                            source.path.display(),
                            df.height(),
                            acc.height()
                        )));
                    }
                    acc.hstack(df.get_columns())?
                }
            });
        }
        Ok(merged.unwrap_or_else(DataFrame::empty))
    }

    fn write_selection_file(path: &Path, nrows: usize, indices: &[usize]) -> Result<()> {
        let mut selected = vec![indices.is_empty(); nrows];
        for &i in indices {
            if i < nrows {
                selected[i] = true;
            }
        }

        let mut out = fs::File::create(path)?;
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(out, "\"reefscope selection, written {}\"", now)?;
        writeln!(out, "selected")?;
        for flag in selected {
            writeln!(out, "{}", if flag { 1 } else { 0 })?;
        }
        Ok(())
    }

    fn write_colormap_file(path: &Path, glyphs: &[String]) -> Result<()> {
        let mut out = fs::File::create(path)?;
        writeln!(out, "color")?;
        for glyph in glyphs {
            writeln!(out, "{}", glyph)?;
        }
        Ok(())
    }
}

impl Default for FilesystemProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for FilesystemProvider {
    fn reload(&mut self) -> Result<()> {
        let vertices = Self::merge(&self.vertex_files, "vertex")?;
        let edges = Self::merge(&self.edge_files, "edge")?;

        info!(
            "loaded {} vertices, {} edges from {} file(s)",
            vertices.height(),
            edges.height(),
            self.vertex_files.len() + self.edge_files.len()
        );

        self.vertices = vertices;
        self.edges = edges;
        self.signal.emit();
        Ok(())
    }

    fn vertices(&self) -> DataFrame {
        self.vertices.clone()
    }

    fn edges(&self) -> DataFrame {
        self.edges.clone()
    }

    fn write_vertex_selection(&mut self, indices: &[usize]) -> Result<()> {
        if let Some(path) = &self.vertex_selection_path {
            Self::write_selection_file(path, self.vertices.height(), indices)?;
        }
        Ok(())
    }

    fn write_edge_selection(&mut self, indices: &[usize]) -> Result<()> {
        if let Some(path) = &self.edge_selection_path {
            Self::write_selection_file(path, self.edges.height(), indices)?;
        }
        Ok(())
    }

    fn write_vertex_colormap(&mut self, glyphs: &[String]) -> Result<()> {
        if let Some(path) = &self.vertex_colormap_path {
            Self::write_colormap_file(path, glyphs)?;
        }
        Ok(())
    }

    fn write_edge_colormap(&mut self, glyphs: &[String]) -> Result<()> {
        if let Some(path) = &self.edge_colormap_path {
            Self::write_colormap_file(path, glyphs)?;
        }
        Ok(())
    }

    fn subscribe(&mut self, listener: ChangeListener) {
        self.signal.connect(listener);
    }
}
