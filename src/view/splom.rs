//! Scatter-plot-matrix view
//!
//! An n x n grid of scatter plots over a chosen subset of scalar columns.
//! The engine keeps the subset valid across reloads and exposes the ordered
//! axis pairs of the matrix.

use crate::data::columns::scalar_columns;
use crate::error::Result;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

/// Number of columns shown when nothing was chosen yet
const DEFAULT_MATRIX_SIZE: usize = 3;

pub struct SplomView {
    pub columns: Vec<String>,
    pub available_columns: Vec<String>,
}

impl SplomView {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            available_columns: Vec::new(),
        }
    }

    /// Ordered (x, y) axis pairs of the full matrix, row-major with the
    /// diagonal included (clients usually draw a histogram there)
    pub fn axis_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.columns.len() * self.columns.len());
        for y in &self.columns {
            for x in &self.columns {
                pairs.push((x.clone(), y.clone()));
            }
        }
        pairs
    }
}

impl Default for SplomView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for SplomView {
    fn kind(&self) -> ViewKind {
        ViewKind::Splom
    }

    fn reload_df(&mut self, data: &mut SessionData) -> Result<()> {
        self.available_columns = scalar_columns(&data.vertices);
        self.columns
            .retain(|c| self.available_columns.iter().any(|a| a == c));
        if self.columns.is_empty() {
            self.columns = self
                .available_columns
                .iter()
                .take(DEFAULT_MATRIX_SIZE)
                .cloned()
                .collect();
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
    use crate::session::tests_support::data_with_vertices;
    use polars::prelude::*;

    fn sample_data() -> SessionData {
        data_with_vertices(
            DataFrame::new(vec![
                Series::new("a".into(), &[1.0f64, 2.0]).into(),
                Series::new("b".into(), &[3.0f64, 4.0]).into(),
                Series::new("c".into(), &[5.0f64, 6.0]).into(),
                Series::new("d".into(), &[7.0f64, 8.0]).into(),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_defaults_to_leading_columns() {
        let mut data = sample_data();
        let mut view = SplomView::new();
        view.reload_df(&mut data).unwrap();
        assert_eq!(view.columns, vec!["a", "b", "c"]);
        assert_eq!(view.axis_pairs().len(), 9);
    }

    #[test]
    fn test_dropped_column_is_pruned() {
        let mut data = sample_data();
        let mut view = SplomView::new();
        view.columns = vec!["b".to_string(), "gone".to_string(), "d".to_string()];
        view.reload_df(&mut data).unwrap();
        assert_eq!(view.columns, vec!["b", "d"]);

        let pairs = view.axis_pairs();
        assert_eq!(pairs[0], ("b".to_string(), "b".to_string()));
        assert_eq!(pairs[1], ("d".to_string(), "b".to_string()));
    }
}
