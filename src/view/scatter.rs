//! Scatter view
//!
//! Two scalar axes over the vertex sink. The view's only derived state is
//! the axis choice, which must stay valid across reloads.

use crate::data::columns::scalar_columns;
use crate::error::Result;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

pub struct ScatterView {
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    /// Columns currently offered by both axis menus
    pub axis_columns: Vec<String>,
}

impl ScatterView {
    pub fn new() -> Self {
        Self {
            x_column: None,
            y_column: None,
            axis_columns: Vec::new(),
        }
    }
}

impl Default for ScatterView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ScatterView {
    fn kind(&self) -> ViewKind {
        ViewKind::Scatter
    }

    fn reload_df(&mut self, data: &mut SessionData) -> Result<()> {
        self.axis_columns = scalar_columns(&data.vertices);

        let valid = |choice: &Option<String>| {
            choice
                .as_ref()
                .map(|c| self.axis_columns.iter().any(|a| a == c))
                .unwrap_or(false)
        };

        if !valid(&self.x_column) {
            self.x_column = self.axis_columns.first().cloned();
        }
        if !valid(&self.y_column) {
            self.y_column = self
                .axis_columns
                .get(1)
                .or_else(|| self.axis_columns.first())
                .cloned();
        }
        Ok(())
    }

    fn reload_cds(&mut self, _data: &mut SessionData) -> Result<()> {
        Ok(())
    }
}
