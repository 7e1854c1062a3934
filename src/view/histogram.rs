//! Histogram view
//!
//! A stacked histogram of one scalar column, split by the vertex color
//! factor map and computed separately for the selection and its complement.
//! The two stacks share bin edges derived from the whole table, so the
//! selected bars (growing up from zero) and the unselected bars (mirrored
//! below zero) compare bin-for-bin.

use log::warn;

use crate::constants::histogram as defaults;
use crate::data::Epoch;
use crate::data::columns::scalar_columns;
use crate::error::Result;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

/// Render series of one stacked histogram: one quad per (factor, bin) pair
#[derive(Debug, Clone, Default)]
pub struct StackedSeries {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub top: Vec<f64>,
    pub bottom: Vec<f64>,
    pub color: Vec<String>,
    pub count: Vec<f64>,
    pub label: Vec<String>,
    /// count / total count of the bin, for hover percentages
    pub ratio: Vec<f64>,
}

/// Render series of the overall histogram, one quad per bin
#[derive(Debug, Clone, Default)]
pub struct OverallSeries {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub top: Vec<f64>,
    pub bottom: Vec<f64>,
    pub count: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct HistogramAggregate {
    /// The shared bin edges (nbins + 1 values)
    pub edges: Vec<f64>,
    pub all: OverallSeries,
    pub selected: StackedSeries,
    pub unselected: StackedSeries,
    /// Largest overall bin count, for symmetric axis scaling
    pub hist_max: f64,
}

impl HistogramAggregate {
    /// Symmetric y-axis limits with headroom over the tallest bin, so the
    /// mirrored unselected stack stays visible
    pub fn axis_limits(&self) -> (f64, f64) {
        let limit = defaults::AXIS_HEADROOM * self.hist_max;
        (-limit, limit)
    }
}

/// Everything the aggregate depends on. The histogram is recomputed exactly
/// when one of these changed, and never serves stale bins.
#[derive(Debug, Clone, PartialEq)]
struct Stamp {
    epoch: Epoch,
    selection_revision: u64,
    fmap_revision: u64,
    column: String,
    nbins: usize,
    bin_range: Option<(f64, f64)>,
}

pub struct HistogramView {
    pub column: Option<String>,
    pub nbins: usize,
    /// Explicit bin range; when unset the whole table's [min, max] is used
    pub bin_range: Option<(f64, f64)>,
    pub aggregate: HistogramAggregate,
    stamp: Option<Stamp>,
}

impl HistogramView {
    pub fn new() -> Self {
        Self {
            column: None,
            nbins: defaults::DEFAULT_NBINS,
            bin_range: None,
            aggregate: HistogramAggregate::default(),
            stamp: None,
        }
    }

    /// Choose another column; the aggregate refreshes on the next
    /// `refresh` (the session calls one of the change hooks right after)
    pub fn set_column(&mut self, column: Option<String>) {
        self.column = column;
    }

    fn refresh(&mut self, data: &SessionData) -> Result<()> {
        let Some(column) = self.column.clone() else {
            return Ok(());
        };
        if !data.vertices.has_column(&column) {
            // recoverable skip: the view keeps its last consistent bins
            warn!("histogram column '{}' not in table, skipping", column);
            return Ok(());
        }

        let stamp = Stamp {
            epoch: data.vertices.epoch(),
            selection_revision: data.cds.selection_revision(),
            fmap_revision: data.fmap_color.revision(),
            column: column.clone(),
            nbins: self.nbins,
            bin_range: self.bin_range,
        };
        if self.stamp.as_ref() == Some(&stamp) {
            return Ok(());
        }

        debug_assert_eq!(
            data.fmap_color.epoch(),
            Some(data.vertices.epoch()),
            "factor map outlived its table epoch"
        );

        let values = data.vertices.column_as_f64(&column)?;
        let glyphs: Vec<String> = (0..data.fmap_color.factors().len())
            .map(|i| data.fmap_color.glyph_of(i).to_string())
            .collect();

        self.aggregate = compute_histogram(
            &values,
            data.fmap_color.id_column(),
            &data.fmap_color.factors(),
            &glyphs,
            &data.cds.selection_mask(),
            self.nbins,
            self.bin_range,
        );
        self.stamp = Some(stamp);
        Ok(())
    }
}

impl Default for HistogramView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for HistogramView {
    fn kind(&self) -> ViewKind {
        ViewKind::Histogram
    }

    fn reload_df(&mut self, data: &mut SessionData) -> Result<()> {
        let columns = scalar_columns(&data.vertices);
        let valid = self
            .column
            .as_ref()
            .map(|c| columns.iter().any(|a| a == c))
            .unwrap_or(false);
        if !valid {
            self.column = columns.first().cloned();
        }
        Ok(())
    }

    fn reload_cds(&mut self, data: &mut SessionData) -> Result<()> {
        self.refresh(data)
    }

    fn selection_changed(&mut self, data: &SessionData) -> Result<()> {
        self.refresh(data)
    }

    fn factor_map_changed(&mut self, data: &SessionData) -> Result<()> {
        self.refresh(data)
    }
}

/// Joint (value, factor) histogram for the selection and its complement,
/// rendered as the three series described in the module docs.
#[profiling::function]
fn compute_histogram(
    values: &[f64],
    factor_ids: &[u32],
    factors: &[String],
    glyphs: &[String],
    mask: &[bool],
    nbins: usize,
    bin_range: Option<(f64, f64)>,
) -> HistogramAggregate {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() || nbins == 0 {
        return HistogramAggregate::default();
    }

    // Bin edges span the whole table, not the selection, so both stacks
    // share the same bins.
    let (mut xmin, mut xmax) = bin_range.unwrap_or_else(|| {
        let min = finite.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    });
    if !(xmax > xmin) {
        xmax = xmin + 1.0;
    }
    let width = (xmax - xmin) / nbins as f64;
    let edges: Vec<f64> = (0..=nbins).map(|i| xmin + width * i as f64).collect();

    let nfactors = factors.len();
    let mut selected_counts = vec![vec![0.0f64; nfactors]; nbins];
    let mut unselected_counts = vec![vec![0.0f64; nfactors]; nbins];

    for ((&value, &id), &in_selection) in values.iter().zip(factor_ids).zip(mask) {
        if value.is_nan() || value < xmin || value > xmax {
            continue;
        }
        let bin = (((value - xmin) / width) as usize).min(nbins - 1);
        if in_selection {
            selected_counts[bin][id as usize] += 1.0;
        } else {
            unselected_counts[bin][id as usize] += 1.0;
        }
    }

    let all_counts: Vec<f64> = (0..nbins)
        .map(|bin| {
            selected_counts[bin].iter().sum::<f64>() + unselected_counts[bin].iter().sum::<f64>()
        })
        .collect();
    let hist_max = all_counts.iter().cloned().fold(0.0, f64::max);

    let left: Vec<f64> = edges[..nbins].to_vec();
    let right: Vec<f64> = edges[1..].to_vec();

    let all = OverallSeries {
        left: left.clone(),
        right: right.clone(),
        top: all_counts.clone(),
        bottom: vec![0.0; nbins],
        count: all_counts.clone(),
    };

    let selected = stack_series(
        &selected_counts,
        &all_counts,
        factors,
        glyphs,
        &left,
        &right,
        StackDirection::Up,
    );
    let unselected = stack_series(
        &unselected_counts,
        &all_counts,
        factors,
        glyphs,
        &left,
        &right,
        StackDirection::Down,
    );

    HistogramAggregate {
        edges,
        all,
        selected,
        unselected,
        hist_max,
    }
}

enum StackDirection {
    /// Stacks grow up from zero
    Up,
    /// Stacks mirror down from zero
    Down,
}

fn stack_series(
    counts: &[Vec<f64>],
    all_counts: &[f64],
    factors: &[String],
    glyphs: &[String],
    left: &[f64],
    right: &[f64],
    direction: StackDirection,
) -> StackedSeries {
    let nbins = counts.len();
    let mut series = StackedSeries::default();
    let mut baseline = vec![0.0f64; nbins];

    for (ifactor, factor) in factors.iter().enumerate() {
        for bin in 0..nbins {
            let count = counts[bin][ifactor];
            let (bottom, top) = match direction {
                StackDirection::Up => {
                    let bottom = baseline[bin];
                    baseline[bin] = bottom + count;
                    (bottom, baseline[bin])
                }
                StackDirection::Down => {
                    let top = baseline[bin];
                    baseline[bin] = top - count;
                    (baseline[bin], top)
                }
            };
            let ratio = if all_counts[bin] > 0.0 {
                count / all_counts[bin]
            } else {
                0.0
            };

            series.left.push(left[bin]);
            series.right.push(right[bin]);
            series.bottom.push(bottom);
            series.top.push(top);
            series.color.push(glyphs[ifactor].clone());
            series.count.push(count);
            series.label.push(factor.clone());
            series.ratio.push(ratio);
        }
    }
    series
}
