//! Flower view
//!
//! A radial glyph summarizing the current selection: one petal per scalar
//! column, the petal radius being the selection's mean normalized into the
//! whole table's [min, max] range. Label positions are precomputed so the
//! client only draws.

use std::f64::consts::PI;

use crate::data::columns::scalar_columns;
use crate::error::Result;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

/// Petal radius above which the label moves inside the petal
const LABEL_INSIDE_THRESHOLD: f64 = 0.7;

/// Radial offset of labels drawn outside their petal
const LABEL_OUTSIDE_OFFSET: f64 = 0.08;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelAlign {
    Left,
    Right,
}

/// One petal of the flower glyph, render-ready
#[derive(Debug, Clone)]
pub struct Petal {
    pub column: String,
    /// Mean of the selection, normalized into the table's [min, max]
    pub radius: f64,
    /// Raw mean of the selection, for hover text
    pub mean: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub label_x: f64,
    pub label_y: f64,
    pub label_angle: f64,
    pub label_align: LabelAlign,
}

pub struct FlowerView {
    pub petals: Vec<Petal>,
}

impl FlowerView {
    pub fn new() -> Self {
        Self { petals: Vec::new() }
    }

    fn refresh(&mut self, data: &SessionData) -> Result<()> {
        let columns = scalar_columns(&data.vertices);
        let mask = data.cds.selection_mask();

        self.petals.clear();
        let ncolumns = columns.len();
        if ncolumns == 0 {
            return Ok(());
        }

        let delta = 2.0 * PI / ncolumns as f64;
        for (i, column) in columns.into_iter().enumerate() {
            let values = data.vertices.column_as_f64(&column)?;
            let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
            if finite.is_empty() {
                continue;
            }

            let min = finite.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            let selected: Vec<f64> = values
                .iter()
                .zip(&mask)
                .filter(|&(ref v, &m)| m && !v.is_nan())
                .map(|(&v, _)| v)
                .collect();
            if selected.is_empty() {
                continue;
            }
            let mean = selected.iter().sum::<f64>() / selected.len() as f64;

            let radius = if max > min {
                (mean - min) / (max - min)
            } else {
                1.0
            };

            let angle = delta * i as f64;
            let (label_x, label_y, label_angle, label_align) = place_label(angle, radius);

            self.petals.push(Petal {
                column,
                radius,
                mean,
                start_angle: angle - delta / 2.0,
                end_angle: angle + delta / 2.0,
                label_x,
                label_y,
                label_angle,
                label_align,
            });
        }
        Ok(())
    }
}

/// Position a petal's label: inside the petal when it is large enough,
/// just outside it otherwise, oriented towards the flower center. The
/// orientation flips on the left half of the circle so text never reads
/// upside-down.
fn place_label(angle: f64, radius: f64) -> (f64, f64, f64, LabelAlign) {
    let label_radius = if radius > LABEL_INSIDE_THRESHOLD {
        radius / 2.0
    } else {
        radius + LABEL_OUTSIDE_OFFSET
    };

    let x = angle.cos() * label_radius;
    let y = angle.sin() * label_radius;

    if (PI / 2.0..=PI * 1.5).contains(&angle) {
        (x, y, angle + PI, LabelAlign::Right)
    } else {
        (x, y, angle, LabelAlign::Left)
    }
}

impl Default for FlowerView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for FlowerView {
    fn kind(&self) -> ViewKind {
        ViewKind::Flower
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
