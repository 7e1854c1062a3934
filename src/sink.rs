//! Render sink
//!
//! The engine does not draw. It maintains one `ColumnSource` per table: a
//! bulk-replaceable snapshot of the table that the rendering layer reads,
//! plus the selection made in that layer. The source is the single shared
//! synchronization point between the engine and its clients; everything the
//! client needs (data columns, factor glyph columns, layout positions) is a
//! column here.

use polars::prelude::*;

use crate::data::{Epoch, Table};
use crate::error::Result;

/// Snapshot of a table for the rendering layer, plus the current selection.
pub struct ColumnSource {
    name: String,
    data: DataFrame,
    epoch: Epoch,
    selected: Vec<usize>,
    selection_revision: u64,
}

impl ColumnSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: DataFrame::empty(),
            epoch: Epoch::default(),
            selected: Vec::new(),
            selection_revision: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Epoch of the table snapshot currently held
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// Bulk-replace the snapshot from the table. A single atomic swap, never
    /// incremental column patches, so clients observe no partial update.
    /// Selection indices that fall out of range are dropped.
    pub fn replace_from(&mut self, table: &Table) {
        self.data = table.dataframe().clone();
        self.epoch = table.epoch();

        let height = self.data.height();
        if self.selected.iter().any(|&i| i >= height) {
            self.selected.retain(|&i| i < height);
            self.selection_revision += 1;
        }
    }

    /// Patch one column into the snapshot outside a reload. The source must
    /// hold the same epoch as the table the column was computed from; a
    /// mismatch is a defect in the reload ordering, not a recoverable state.
    pub fn patch_column(&mut self, source_epoch: Epoch, series: Series) -> Result<()> {
        debug_assert_eq!(
            source_epoch, self.epoch,
            "stale epoch pushed into sink '{}'",
            self.name
        );
        self.data.with_column(series)?;
        Ok(())
    }

    /// The selection as an index set (sorted, deduplicated)
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    /// Replace the selection. Indices out of range are dropped. Returns
    /// true if the effective selection changed.
    pub fn set_selected(&mut self, indices: &[usize]) -> bool {
        let height = self.data.height();
        let mut normalized: Vec<usize> =
            indices.iter().copied().filter(|&i| i < height).collect();
        normalized.sort_unstable();
        normalized.dedup();

        if normalized == self.selected {
            return false;
        }
        self.selected = normalized;
        self.selection_revision += 1;
        true
    }

    /// Bumped whenever the effective selection changes
    pub fn selection_revision(&self) -> u64 {
        self.selection_revision
    }

    /// Per-row selection mask. An empty selection means nothing is selected
    /// in the client, which every aggregation treats as "all rows"; the mask
    /// implements that convention.
    pub fn selection_mask(&self) -> Vec<bool> {
        let height = self.data.height();
        if self.selected.is_empty() {
            return vec![true; height];
        }
        let mut mask = vec![false; height];
        for &i in &self.selected {
            mask[i] = true;
        }
        mask
    }

    /// True if the selection is empty (client has nothing selected)
    pub fn selection_is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> Table {
        let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
        Table::new(DataFrame::new(vec![Series::new("x".into(), values).into()]).unwrap())
    }

    #[test]
    fn test_replace_clamps_selection() {
        let mut source = ColumnSource::new("vertices");
        source.replace_from(&table(5));
        assert!(source.set_selected(&[1, 4, 4, 2]));
        assert_eq!(source.selected(), &[1, 2, 4]);

        let rev = source.selection_revision();
        source.replace_from(&table(3));
        assert_eq!(source.selected(), &[1, 2]);
        assert!(source.selection_revision() > rev);
    }

    #[test]
    fn test_set_selected_no_change_keeps_revision() {
        let mut source = ColumnSource::new("vertices");
        source.replace_from(&table(4));
        source.set_selected(&[0, 1]);
        let rev = source.selection_revision();
        assert!(!source.set_selected(&[1, 0]));
        assert_eq!(source.selection_revision(), rev);
    }

    #[test]
    fn test_selection_mask_empty_means_all() {
        let mut source = ColumnSource::new("vertices");
        source.replace_from(&table(3));
        assert_eq!(source.selection_mask(), vec![true, true, true]);

        source.set_selected(&[2]);
        assert_eq!(source.selection_mask(), vec![false, false, true]);
    }

    #[test]
    fn test_patch_column_tracks_epoch() {
        let t = table(2);
        let mut source = ColumnSource::new("vertices");
        source.replace_from(&t);
        source
            .patch_column(t.epoch(), Series::new("reef:color:id".into(), &[0u32, 1u32]))
            .unwrap();
        assert!(source.data().column("reef:color:id").is_ok());
    }
}
