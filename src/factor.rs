//! Factor maps
//!
//! Categorical data (labels, groups, generations) cannot be rendered
//! directly; a `FactorMap` wraps one table column and derives a stable
//! categorical encoding from it: the naturally sorted list of distinct
//! values (factors), a dense numeric id per factor, and a glyph (color or
//! marker token) per factor taken from a palette.
//!
//! The natural sort is the stability anchor: two tables holding the same
//! set of distinct values produce the same factor order and therefore the
//! same id and glyph assignment, regardless of row order. Colors stay put
//! across reloads as long as the value set does.
//!
//! The realized per-row columns are written back into the table as
//! `<name>:id` and `<name>:glyph`, where every view and the rendering layer
//! pick them up.

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::factor::{DEFAULT_FACTOR, NULL_FACTOR};
use crate::data::columns::natural_cmp;
use crate::data::{Epoch, Table};
use crate::error::{ReefError, Result};
use crate::sink::ColumnSource;

/// Behaviour when there are more factors than palette entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaletteMode {
    /// Wrap around: factor i gets `palette[i % len]`
    Cycle,
    /// Clamp: factor i gets `palette[min(i, len - 1)]`
    RepeatLast,
}

pub struct FactorMap {
    name: String,
    column_name: Option<String>,
    palette: Vec<String>,
    mode: PaletteMode,

    /// Distinct column values in natural order. A missing value forms one
    /// additional factor, sorted last. `None` when no column is selected.
    factors: Vec<Option<String>>,
    id_column: Vec<u32>,
    glyph_column: Vec<String>,

    /// Bumped on every recompute; views compare revisions to know when
    /// their factor-dependent aggregates went stale.
    revision: u64,
    epoch: Option<Epoch>,
}

impl FactorMap {
    /// An empty palette can never produce a glyph, so it is rejected here
    /// rather than at first use.
    pub fn new(
        name: &str,
        column_name: Option<String>,
        palette: Vec<String>,
        mode: PaletteMode,
    ) -> Result<Self> {
        if palette.is_empty() {
            return Err(ReefError::Config(format!(
                "factor map '{}' constructed with an empty palette",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
            column_name,
            palette,
            mode,
            factors: Vec::new(),
            id_column: Vec::new(),
            glyph_column: Vec::new(),
            revision: 0,
            epoch: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }

    /// Select another column. The assignment is stale until `recompute`.
    pub fn set_column_name(&mut self, column_name: Option<String>) {
        self.column_name = column_name;
    }

    pub fn mode(&self) -> PaletteMode {
        self.mode
    }

    pub fn id_column_name(&self) -> String {
        format!("{}:id", self.name)
    }

    pub fn glyph_column_name(&self) -> String {
        format!("{}:glyph", self.name)
    }

    /// Factor display names in assignment order (missing values show as
    /// the null factor)
    pub fn factors(&self) -> Vec<String> {
        self.factors
            .iter()
            .map(|f| f.clone().unwrap_or_else(|| NULL_FACTOR.to_string()))
            .collect()
    }

    pub fn id_column(&self) -> &[u32] {
        &self.id_column
    }

    pub fn glyph_column(&self) -> &[String] {
        &self.glyph_column
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Epoch of the table the current assignment was computed against
    pub fn epoch(&self) -> Option<Epoch> {
        self.epoch
    }

    /// Glyph of the i-th factor according to the palette mode
    pub fn glyph_of(&self, index: usize) -> &str {
        let i = match self.mode {
            PaletteMode::Cycle => index % self.palette.len(),
            PaletteMode::RepeatLast => index.min(self.palette.len() - 1),
        };
        &self.palette[i]
    }

    /// Recompute the factor assignment against the table and write the
    /// realized `<name>:id` / `<name>:glyph` columns into it.
    ///
    /// A column name absent from the table (or no column selected) yields a
    /// single default factor so that every row always has a renderable
    /// encoding.
    pub fn recompute(&mut self, table: &mut Table) -> Result<()> {
        let nrows = table.height();

        let column = self
            .column_name
            .as_deref()
            .filter(|name| table.has_column(name));

        match column {
            None => {
                self.factors = vec![Some(DEFAULT_FACTOR.to_string())];
                self.id_column = vec![0; nrows];
                self.glyph_column = vec![self.palette[0].clone(); nrows];
            }
            Some(name) => {
                let values = table.column_as_opt_string(name)?;

                // Distinct values, naturally sorted, null last.
                let mut distinct: Vec<String> = Vec::new();
                let mut has_null = false;
                {
                    let mut seen = HashMap::new();
                    for value in &values {
                        match value {
                            Some(v) => {
                                seen.entry(v.clone()).or_insert(());
                            }
                            None => has_null = true,
                        }
                    }
                    distinct.extend(seen.into_keys());
                }
                distinct.sort_by(|a, b| natural_cmp(a, b));

                self.factors = distinct.into_iter().map(Some).collect();
                if has_null {
                    self.factors.push(None);
                }

                let ids: HashMap<&Option<String>, u32> = self
                    .factors
                    .iter()
                    .enumerate()
                    .map(|(i, factor)| (factor, i as u32))
                    .collect();

                self.id_column = values.iter().map(|v| ids[v]).collect();
                self.glyph_column = self
                    .id_column
                    .iter()
                    .map(|&id| self.glyph_of(id as usize).to_string())
                    .collect();
            }
        }

        table.set_column(Series::new(
            self.id_column_name().into(),
            self.id_column.clone(),
        ))?;
        table.set_column(Series::new(
            self.glyph_column_name().into(),
            self.glyph_column.clone(),
        ))?;

        self.epoch = Some(table.epoch());
        self.revision += 1;
        Ok(())
    }

    /// Propagate the realized columns to the render sink. Used outside a
    /// reload; during a reload the bulk replace carries them.
    pub fn push(&self, sink: &mut ColumnSource) -> Result<()> {
        let epoch = self.epoch.expect("push before first recompute");
        sink.patch_column(
            epoch,
            Series::new(self.id_column_name().into(), self.id_column.clone()),
        )?;
        sink.patch_column(
            epoch,
            Series::new(self.glyph_column_name().into(), self.glyph_column.clone()),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of_labels(labels: Vec<Option<&str>>) -> Table {
        let values: Vec<Option<String>> =
            labels.into_iter().map(|l| l.map(|s| s.to_string())).collect();
        Table::new(
            DataFrame::new(vec![Series::new("label".into(), values).into()]).unwrap(),
        )
    }

    fn palette(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_palette_rejected() {
        let result = FactorMap::new("reef:color", None, vec![], PaletteMode::Cycle);
        assert!(matches!(result, Err(ReefError::Config(_))));
    }

    #[test]
    fn test_no_column_yields_default_factor() {
        let mut table = table_of_labels(vec![Some("a"); 5]);
        let mut fmap = FactorMap::new(
            "reef:color",
            None,
            palette(&["blue", "green"]),
            PaletteMode::Cycle,
        )
        .unwrap();

        fmap.recompute(&mut table).unwrap();

        assert_eq!(fmap.factors(), vec!["None"]);
        assert_eq!(fmap.id_column(), &[0, 0, 0, 0, 0]);
        assert_eq!(fmap.glyph_column(), &["blue"; 5]);
        assert!(table.has_column("reef:color:id"));
        assert!(table.has_column("reef:color:glyph"));
    }

    #[test]
    fn test_absent_column_behaves_like_none() {
        let mut table = table_of_labels(vec![Some("a"), Some("b")]);
        let mut fmap = FactorMap::new(
            "reef:color",
            Some("gone".to_string()),
            palette(&["blue"]),
            PaletteMode::Cycle,
        )
        .unwrap();
        fmap.recompute(&mut table).unwrap();
        assert_eq!(fmap.factors(), vec!["None"]);
    }

    #[test]
    fn test_natural_sort_assignment() {
        let mut table = table_of_labels(vec![Some("item2"), Some("item10"), Some("item1")]);
        let mut fmap = FactorMap::new(
            "reef:color",
            Some("label".to_string()),
            palette(&["c0", "c1", "c2"]),
            PaletteMode::Cycle,
        )
        .unwrap();

        fmap.recompute(&mut table).unwrap();

        assert_eq!(fmap.factors(), vec!["item1", "item2", "item10"]);
        // rows were item2, item10, item1
        assert_eq!(fmap.id_column(), &[1, 2, 0]);
    }

    #[test]
    fn test_stability_across_row_reorder() {
        let mut t1 = table_of_labels(vec![Some("b"), Some("a"), Some("c"), Some("a")]);
        let mut t2 = table_of_labels(vec![Some("c"), Some("a"), Some("a"), Some("b")]);

        let mut f1 = FactorMap::new(
            "reef:color",
            Some("label".to_string()),
            palette(&["c0", "c1"]),
            PaletteMode::Cycle,
        )
        .unwrap();
        let mut f2 = FactorMap::new(
            "reef:color",
            Some("label".to_string()),
            palette(&["c0", "c1"]),
            PaletteMode::Cycle,
        )
        .unwrap();

        f1.recompute(&mut t1).unwrap();
        f2.recompute(&mut t2).unwrap();

        assert_eq!(f1.factors(), f2.factors());
        // same value set, same glyph per factor
        for i in 0..f1.factors().len() {
            assert_eq!(f1.glyph_of(i), f2.glyph_of(i));
        }
    }

    #[test]
    fn test_palette_cycle_wraps() {
        let mut table = table_of_labels(vec![Some("a"), Some("b"), Some("c"), Some("d")]);
        let mut fmap = FactorMap::new(
            "reef:color",
            Some("label".to_string()),
            palette(&["c0", "c1", "c2"]),
            PaletteMode::Cycle,
        )
        .unwrap();
        fmap.recompute(&mut table).unwrap();

        assert_eq!(fmap.glyph_of(0), "c0");
        assert_eq!(fmap.glyph_of(2), "c2");
        assert_eq!(fmap.glyph_of(3), "c0");
        assert_eq!(fmap.glyph_column()[3], "c1");
    }

    #[test]
    fn test_palette_repeat_last_clamps() {
        let mut table =
            table_of_labels(vec![Some("a"), Some("b"), Some("c"), Some("d"), Some("e")]);
        let mut fmap = FactorMap::new(
            "reef:marker",
            Some("label".to_string()),
            palette(&["circle", "diamond"]),
            PaletteMode::RepeatLast,
        )
        .unwrap();
        fmap.recompute(&mut table).unwrap();

        assert_eq!(fmap.glyph_of(0), "circle");
        assert_eq!(fmap.glyph_of(1), "diamond");
        assert_eq!(fmap.glyph_of(4), "diamond");
    }

    #[test]
    fn test_null_values_form_last_factor() {
        let mut table = table_of_labels(vec![Some("b"), None, Some("a"), None]);
        let mut fmap = FactorMap::new(
            "reef:color",
            Some("label".to_string()),
            palette(&["c0", "c1", "c2"]),
            PaletteMode::Cycle,
        )
        .unwrap();
        fmap.recompute(&mut table).unwrap();

        assert_eq!(fmap.factors(), vec!["a", "b", "NaN"]);
        assert_eq!(fmap.id_column(), &[1, 2, 0, 2]);
    }

    #[test]
    fn test_recompute_bumps_revision() {
        let mut table = table_of_labels(vec![Some("a")]);
        let mut fmap = FactorMap::new(
            "reef:color",
            Some("label".to_string()),
            palette(&["c0"]),
            PaletteMode::Cycle,
        )
        .unwrap();

        assert_eq!(fmap.revision(), 0);
        fmap.recompute(&mut table).unwrap();
        assert_eq!(fmap.revision(), 1);
        fmap.recompute(&mut table).unwrap();
        assert_eq!(fmap.revision(), 2);
        assert_eq!(fmap.epoch(), Some(table.epoch()));
    }
}
