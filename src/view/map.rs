//! Map view
//!
//! Shows the sample locations on a tiled web map. The engine's share of the
//! work is choosing the latitude/longitude columns and projecting them to
//! Web-Mercator coordinates, written into the vertex table so the bulk sink
//! replace carries them to the client.

use polars::prelude::*;

use crate::constants::map as map_constants;
use crate::data::columns::scalar_columns;
use crate::error::Result;
use crate::session::SessionData;
use crate::view::{View, ViewKind};

/// Convert latitude/longitude (degrees) to Web-Mercator coordinates
pub fn latlong_to_mercator(lat: f64, long: f64) -> (f64, f64) {
    let k = map_constants::MERCATOR_K;
    let x = long * (k * std::f64::consts::PI / 180.0);
    let y = ((90.0 + lat) * std::f64::consts::PI / 360.0).tan().ln() * k;
    (x, y)
}

pub struct MapView {
    pub latitude_column: Option<String>,
    pub longitude_column: Option<String>,
}

impl MapView {
    pub fn new() -> Self {
        Self {
            latitude_column: None,
            longitude_column: None,
        }
    }

    /// Pick the first scalar column whose name contains the keyword
    fn detect(columns: &[String], keyword: &str) -> Option<String> {
        columns
            .iter()
            .find(|c| c.to_lowercase().contains(keyword))
            .cloned()
    }

    fn project(&self, data: &mut SessionData) -> Result<()> {
        let (Some(lat_col), Some(long_col)) = (&self.latitude_column, &self.longitude_column)
        else {
            return Ok(());
        };

        let latitudes = data.vertices.column_as_f64(lat_col)?;
        let longitudes = data.vertices.column_as_f64(long_col)?;

        let mut xs = Vec::with_capacity(latitudes.len());
        let mut ys = Vec::with_capacity(latitudes.len());
        for (&lat, &long) in latitudes.iter().zip(longitudes.iter()) {
            let (x, y) = latlong_to_mercator(lat, long);
            xs.push(x);
            ys.push(y);
        }

        data.vertices
            .set_column(Series::new(map_constants::MERCATOR_X.into(), xs))?;
        data.vertices
            .set_column(Series::new(map_constants::MERCATOR_Y.into(), ys))?;
        Ok(())
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for MapView {
    fn kind(&self) -> ViewKind {
        ViewKind::Map
    }

    fn reload_df(&mut self, data: &mut SessionData) -> Result<()> {
        let columns = scalar_columns(&data.vertices);

        let valid = |choice: &Option<String>| {
            choice
                .as_ref()
                .map(|c| columns.iter().any(|a| a == c))
                .unwrap_or(false)
        };
        if !valid(&self.latitude_column) {
            self.latitude_column = Self::detect(&columns, "latitude");
        }
        if !valid(&self.longitude_column) {
            self.longitude_column = Self::detect(&columns, "longitude");
        }

        self.project(data)
    }

    fn reload_cds(&mut self, _data: &mut SessionData) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests_support::data_with_vertices;

    #[test]
    fn test_mercator_fixed_points() {
        let (x, y) = latlong_to_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-6);

        let (x, _) = latlong_to_mercator(0.0, 180.0);
        assert!((x - map_constants::MERCATOR_K * std::f64::consts::PI).abs() < 1.0);

        // northern latitudes project upward
        let (_, y_north) = latlong_to_mercator(52.0, 13.0);
        let (_, y_south) = latlong_to_mercator(-52.0, 13.0);
        assert!(y_north > 0.0);
        assert!((y_north + y_south).abs() < 1e-6);
    }

    #[test]
    fn test_detects_and_projects_location_columns() {
        let mut data = data_with_vertices(
            DataFrame::new(vec![
                Series::new("input:latitude".into(), &[52.0f64, 53.0]).into(),
                Series::new("input:longitude".into(), &[13.0f64, 14.0]).into(),
            ])
            .unwrap(),
        );

        let mut view = MapView::new();
        view.reload_df(&mut data).unwrap();

        assert_eq!(view.latitude_column.as_deref(), Some("input:latitude"));
        assert_eq!(view.longitude_column.as_deref(), Some("input:longitude"));
        assert!(data.vertices.has_column(map_constants::MERCATOR_X));

        let xs = data.vertices.column_as_f64(map_constants::MERCATOR_X).unwrap();
        let (expected, _) = latlong_to_mercator(52.0, 13.0);
        assert!((xs[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_missing_location_columns_is_a_noop() {
        let mut data = data_with_vertices(
            DataFrame::new(vec![Series::new("volume".into(), &[1.0f64]).into()]).unwrap(),
        );
        let mut view = MapView::new();
        view.reload_df(&mut data).unwrap();
        assert_eq!(view.latitude_column, None);
        assert!(!data.vertices.has_column(map_constants::MERCATOR_X));
    }
}
