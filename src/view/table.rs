//! Spreadsheet view
//!
//! Shows the vertex table as-is. The only engine-side state is the visible
//! column list, refreshed on reload.

use crate::data::columns::data_columns;
use crate::error::Result;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

pub struct TableView {
    pub visible_columns: Vec<String>,
}

impl TableView {
    pub fn new() -> Self {
        Self {
            visible_columns: Vec::new(),
        }
    }
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for TableView {
    fn kind(&self) -> ViewKind {
        ViewKind::Table
    }

    fn reload_df(&mut self, data: &mut SessionData) -> Result<()> {
        self.visible_columns = data_columns(&data.vertices);
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

    #[test]
    fn test_visible_columns_exclude_derived() {
        let mut data = data_with_vertices(
            DataFrame::new(vec![
                Series::new("volume".into(), &[1.0f64, 2.0]).into(),
                Series::new("site".into(), &["a", "b"]).into(),
            ])
            .unwrap(),
        );

        let mut view = TableView::new();
        view.reload_df(&mut data).unwrap();

        // factor maps already wrote reef:* columns into the table
        assert!(data.vertices.has_column("reef:color:glyph"));
        assert_eq!(view.visible_columns, vec!["site", "volume"]);
    }
}
