//! Statistics view
//!
//! A spreadsheet of per-column summary statistics over the current
//! selection, transposed so each scalar column is one row. An empty
//! selection summarizes the whole table.

use crate::data::columns::scalar_columns;
use crate::data::stats::{Describe, describe_values};
use crate::error::Result;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

pub struct StatisticsView {
    /// One row per scalar column, in menu order
    pub rows: Vec<(String, Describe)>,
}

impl StatisticsView {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    fn refresh(&mut self, data: &SessionData) -> Result<()> {
        let mask = data.cds.selection_mask();

        self.rows.clear();
        for column in scalar_columns(&data.vertices) {
            let values = data.vertices.column_as_f64(&column)?;
            let selected: Vec<f64> = values
                .iter()
                .zip(&mask)
                .filter(|&(_, &m)| m)
                .map(|(&v, _)| v)
                .collect();
            self.rows.push((column, describe_values(&selected)));
        }
        Ok(())
    }
}

impl Default for StatisticsView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for StatisticsView {
    fn kind(&self) -> ViewKind {
        ViewKind::Statistics
    }

    fn reload_df(&mut self, _data: &mut SessionData) -> Result<()> {
        Ok(())
    }

    fn reload_cds(&mut self, data: &mut SessionData) -> Result<()> {
        self.refresh(data)
    }

    fn selection_changed(&mut self, data: &SessionData) -> Result<()> {
        self.refresh(data)
    }
}
