//! Embedding view
//!
//! Projects a chosen subset of dense scalar columns to a low-dimensional
//! embedding through a pluggable `Reducer` and writes the output dimensions
//! into enumerable `reef:embed:feature:<i>` columns.
//!
//! Reduction is expensive and not needed for baseline viewing, so it runs
//! only on an explicit request or when the column selection changes — never
//! implicitly on reload. A reload merely re-adds the existing embedding
//! columns while they are still valid for the new table.

use log::warn;
use polars::prelude::*;

use crate::constants::embedding as defaults;
use crate::data::columns::dense_scalar_columns;
use crate::error::Result;
use crate::reduce::{Matrix, PcaReducer, Reducer, standardize};
use crate::session::SessionData;
use crate::view::{View, ViewKind};

pub struct EmbeddingView {
    reducer: Box<dyn Reducer>,
    pub columns: Vec<String>,
    pub n_components: usize,
    /// Standardize inputs before reduction. Forced on when the reducer
    /// requires it.
    pub standardize_inputs: bool,
    /// Explained variance per component, for the variance bar display
    pub variance_ratio: Vec<f64>,
    /// Columns currently offered by the feature menu
    pub available_columns: Vec<String>,

    /// Stored output columns, re-added to the table on reload
    coordinates: Vec<Vec<f64>>,
}

impl EmbeddingView {
    pub fn new(reducer: Box<dyn Reducer>) -> Self {
        Self {
            reducer,
            columns: Vec::new(),
            n_components: defaults::DEFAULT_COMPONENTS,
            standardize_inputs: false,
            variance_ratio: Vec::new(),
            available_columns: Vec::new(),
            coordinates: Vec::new(),
        }
    }

    pub fn new_pca() -> Self {
        Self::new(Box::new(PcaReducer))
    }

    pub fn reducer_name(&self) -> &'static str {
        self.reducer.name()
    }

    /// Change the column selection and re-run the reduction
    pub fn set_columns(&mut self, columns: Vec<String>, data: &mut SessionData) -> Result<bool> {
        self.columns = columns;
        self.compute(data)
    }

    /// Run the reduction. Returns false on a documented no-op: zero
    /// selected columns, a vanished column, or missing values in the input
    /// (a dense matrix is required).
    #[profiling::function]
    pub fn compute(&mut self, data: &mut SessionData) -> Result<bool> {
        if self.columns.is_empty() {
            warn!("embedding requested with no feature columns, skipping");
            return Ok(false);
        }

        let mut feature_columns = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            if !data.vertices.has_column(name) {
                warn!("embedding feature column '{}' not in table, skipping", name);
                return Ok(false);
            }
            feature_columns.push(data.vertices.column_as_f64(name)?);
        }

        let matrix = Matrix::from_columns(&feature_columns)?;
        if matrix.has_missing() {
            warn!("embedding input contains missing values, skipping");
            return Ok(false);
        }

        let matrix = if self.standardize_inputs || self.reducer.requires_standardization() {
            standardize(&matrix)
        } else {
            matrix
        };

        let embedding = self.reducer.fit_transform(&matrix, self.n_components)?;

        self.coordinates = (0..embedding.coordinates.cols())
            .map(|c| embedding.coordinates.column(c))
            .collect();
        self.variance_ratio = embedding.explained_variance_ratio.unwrap_or_default();

        self.write_columns(data)?;
        self.push_to_sink(data)?;
        Ok(true)
    }

    fn feature_column_name(i: usize) -> String {
        format!("{}{}", defaults::FEATURE_PREFIX, i)
    }

    fn write_columns(&self, data: &mut SessionData) -> Result<()> {
        for (i, column) in self.coordinates.iter().enumerate() {
            data.vertices.set_column(Series::new(
                Self::feature_column_name(i).into(),
                column.clone(),
            ))?;
        }
        Ok(())
    }

    fn push_to_sink(&self, data: &mut SessionData) -> Result<()> {
        let epoch = data.vertices.epoch();
        for (i, column) in self.coordinates.iter().enumerate() {
            data.cds.patch_column(
                epoch,
                Series::new(Self::feature_column_name(i).into(), column.clone()),
            )?;
        }
        Ok(())
    }
}

impl View for EmbeddingView {
    fn kind(&self) -> ViewKind {
        ViewKind::Embedding
    }

    fn reload_df(&mut self, data: &mut SessionData) -> Result<()> {
        self.available_columns = dense_scalar_columns(&data.vertices);
        self.columns
            .retain(|c| self.available_columns.iter().any(|a| a == c));

        // Re-add the existing embedding, but only while it still describes
        // the rows; a changed row count invalidates it.
        let valid = self
            .coordinates
            .first()
            .map(|c| c.len() == data.vertices.height())
            .unwrap_or(false);
        if valid {
            self.write_columns(data)?;
        } else if !self.coordinates.is_empty() {
            warn!("dropping embedding computed for a previous table shape");
            self.coordinates.clear();
            self.variance_ratio.clear();
        }
        Ok(())
    }

    fn reload_cds(&mut self, _data: &mut SessionData) -> Result<()> {
        Ok(())
    }
}
