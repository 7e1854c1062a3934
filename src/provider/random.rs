//! Random data provider
//!
//! Generates a plausible colony dataset for development and testing: a
//! handful of scalar columns, two label columns, sample locations scattered
//! around a fixed site, and a random spanning tree as connectivity.

use log::{debug, info};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::provider::{ChangeListener, ChangeSignal, DataProvider};

/// Reference location the generated samples cluster around
const SITE_LATITUDE: f64 = 52.5211544;
const SITE_LONGITUDE: f64 = 13.3469807;

pub struct RandomProvider {
    samples: usize,
    seed: Option<u64>,
    vertices: DataFrame,
    edges: DataFrame,
    signal: ChangeSignal,
}

impl RandomProvider {
    pub fn new(samples: usize, seed: Option<u64>) -> Self {
        Self {
            samples,
            seed,
            vertices: DataFrame::empty(),
            edges: DataFrame::empty(),
            signal: ChangeSignal::new(),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Standard normal sample via the Box-Muller transform
    fn normal(rng: &mut StdRng) -> f64 {
        let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = rng.gen_range(0.0..1.0);
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn uniform_column(rng: &mut StdRng, n: usize) -> Vec<f64> {
        (0..n).map(|_| rng.gen_range(0.0..1.0)).collect()
    }

    fn choice_column(rng: &mut StdRng, n: usize, options: &[&str]) -> Vec<String> {
        (0..n)
            .map(|_| options[rng.gen_range(0..options.len())].to_string())
            .collect()
    }
}

impl DataProvider for RandomProvider {
    fn reload(&mut self) -> Result<()> {
        let n = self.samples;
        let mut rng = self.rng();

        let latitude: Vec<f64> = (0..n)
            .map(|_| SITE_LATITUDE + 0.004 * Self::normal(&mut rng))
            .collect();
        let longitude: Vec<f64> = (0..n)
            .map(|_| SITE_LONGITUDE + 0.008 * Self::normal(&mut rng))
            .collect();

        let vertices = DataFrame::new(vec![
            Series::new("input:col A".into(), Self::uniform_column(&mut rng, n)).into(),
            Series::new(
                "input:col B".into(),
                (0..n).map(|_| Self::normal(&mut rng)).collect::<Vec<f64>>(),
            )
            .into(),
            Series::new("input:col C".into(), Self::uniform_column(&mut rng, n)).into(),
            Series::new("input:col D".into(), Self::uniform_column(&mut rng, n)).into(),
            Series::new("input:col E".into(), Self::uniform_column(&mut rng, n)).into(),
            Series::new("input:col F".into(), Self::uniform_column(&mut rng, n)).into(),
            Series::new(
                "input:label A".into(),
                Self::choice_column(&mut rng, n, &["A1", "A2"]),
            )
            .into(),
            Series::new(
                "input:label B".into(),
                Self::choice_column(&mut rng, n, &["B1", "B2", "B3"]),
            )
            .into(),
            Series::new("input:latitude".into(), latitude).into(),
            Series::new("input:longitude".into(), longitude).into(),
        ])?;

        // Random recursive tree: every vertex after the first attaches to a
        // uniformly chosen earlier vertex, giving a spanning tree.
        let mut sources: Vec<i64> = Vec::with_capacity(n.saturating_sub(1));
        let mut targets: Vec<i64> = Vec::with_capacity(n.saturating_sub(1));
        for child in 1..n {
            sources.push(rng.gen_range(0..child) as i64);
            targets.push(child as i64);
        }
        let nedges = sources.len();
        let weight: Vec<f64> = (0..nedges).map(|_| rng.gen_range(0.0..1.0)).collect();

        let edges = DataFrame::new(vec![
            Series::new("source".into(), sources).into(),
            Series::new("target".into(), targets).into(),
            Series::new("weight".into(), weight).into(),
        ])?;

        info!("generated {} random vertices, {} edges", n, nedges);

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
        debug!("vertex selection: {:?}", indices);
        Ok(())
    }

    fn write_edge_selection(&mut self, indices: &[usize]) -> Result<()> {
        debug!("edge selection: {:?}", indices);
        Ok(())
    }

    fn write_vertex_colormap(&mut self, glyphs: &[String]) -> Result<()> {
        debug!("vertex colormap: {} glyphs", glyphs.len());
        Ok(())
    }

    fn write_edge_colormap(&mut self, glyphs: &[String]) -> Result<()> {
        debug!("edge colormap: {} glyphs", glyphs.len());
        Ok(())
    }

    fn subscribe(&mut self, listener: ChangeListener) {
        self.signal.connect(listener);
    }
}
