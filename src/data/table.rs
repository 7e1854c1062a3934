use polars::prelude::*;
use std::path::Path;

use crate::error::{ReefError, Result};

/// Monotonic version tag assigned to a table every time it is replaced
/// wholesale. Derived artifacts (factor maps, bins, layouts, embeddings)
/// record the epoch they were computed against; a mismatch mandates
/// recomputation before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// The next epoch in the sequence
    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// A materialized DataFrame plus its epoch.
///
/// Wholesale replacement (`replace`) bumps the epoch. In-place derived
/// column writes (`set_column`) do not: they enrich the same epoch, which is
/// what keeps factor-map and view columns valid between reloads.
pub struct Table {
    df: DataFrame,
    epoch: Epoch,
}

impl Table {
    pub fn new(df: DataFrame) -> Self {
        Self {
            df,
            epoch: Epoch::default().next(),
        }
    }

    /// An empty table at epoch 1
    pub fn empty() -> Self {
        Self::new(DataFrame::empty())
    }

    /// Load a table from a file (CSV or Parquet)
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ReefError::Config(format!("no file extension: {}", path.display())))?;

        let df = match extension.to_lowercase().as_str() {
            "parquet" => LazyFrame::scan_parquet(path, Default::default())?.collect()?,
            "csv" => LazyCsvReader::new(path)
                .with_has_header(true)
                .with_infer_schema_length(Some(100))
                .with_try_parse_dates(true)
                .finish()?
                .collect()?,
            ext => {
                return Err(ReefError::Config(format!("unsupported file format: {}", ext)));
            }
        };

        Ok(Self::new(df))
    }

    /// Get a reference to the materialized DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Replace the backing DataFrame wholesale. Starts a new epoch.
    pub fn replace(&mut self, df: DataFrame) {
        self.df = df;
        self.epoch = self.epoch.next();
    }

    /// Get the number of rows
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Get the number of columns
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Get all column names
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Get column values as a Series
    pub fn series(&self, name: &str) -> Result<Series> {
        self.df
            .column(name)
            .map(|c| c.as_materialized_series().clone())
            .map_err(|_| ReefError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Write a derived column into the table, replacing any column of the
    /// same name. The epoch is unchanged.
    pub fn set_column(&mut self, series: Series) -> Result<()> {
        self.df.with_column(series)?;
        Ok(())
    }

    /// Get a column's numeric values as Vec<f64>
    /// Non-numeric values are converted to NaN
    /// Datetime/Date columns are converted to Unix timestamps (seconds since epoch)
    pub fn column_as_f64(&self, name: &str) -> Result<Vec<f64>> {
        let series = self.series(name)?;

        // Handle datetime/date types by converting to Unix timestamps
        match series.dtype() {
            DataType::Datetime(_, _) => {
                let timestamps = series
                    .datetime()?
                    .into_iter()
                    .map(|opt| opt.map(|ts| ts as f64 / 1_000_000.0).unwrap_or(f64::NAN))
                    .collect();
                return Ok(timestamps);
            }
            DataType::Date => {
                let timestamps = series
                    .date()?
                    .into_iter()
                    .map(|opt| opt.map(|days| days as f64 * 86400.0).unwrap_or(f64::NAN))
                    .collect();
                return Ok(timestamps);
            }
            _ => {}
        }

        match series.cast(&DataType::Float64) {
            Ok(s) => Ok(s
                .f64()?
                .into_iter()
                .map(|opt| opt.unwrap_or(f64::NAN))
                .collect()),
            Err(_) => {
                // For string columns, try to parse as f64
                if let Ok(str_series) = series.str() {
                    Ok(str_series
                        .into_iter()
                        .map(|opt| opt.and_then(|s| s.parse::<f64>().ok()).unwrap_or(f64::NAN))
                        .collect())
                } else {
                    Ok(vec![f64::NAN; series.len()])
                }
            }
        }
    }

    /// Get a column's values as strings, with nulls preserved as `None`.
    /// This is the canonical row representation used for factor mapping.
    pub fn column_as_opt_string(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.series(name)?;

        if let Ok(str_series) = series.str() {
            return Ok(str_series
                .into_iter()
                .map(|opt| opt.map(|s| s.to_string()))
                .collect());
        }

        let casted = series.cast(&DataType::String)?;
        let ca = casted.str()?;
        Ok(ca.into_iter().map(|opt| opt.map(|s| s.to_string())).collect())
    }

    /// Get a column's string values, nulls rendered as empty strings
    pub fn column_as_string(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .column_as_opt_string(name)?
            .into_iter()
            .map(|opt| opt.unwrap_or_default())
            .collect())
    }

    /// Get an integral column as row indices. Nulls and negative values are
    /// rejected since they cannot address a table row.
    pub fn column_as_indices(&self, name: &str) -> Result<Vec<usize>> {
        let series = self.series(name)?;
        let casted = series.cast(&DataType::Int64)?;
        let ca = casted.i64()?;

        let mut indices = Vec::with_capacity(ca.len());
        for opt in ca.into_iter() {
            match opt {
                Some(v) if v >= 0 => indices.push(v as usize),
                Some(v) => {
                    return Err(ReefError::DataInconsistency(format!(
                        "negative row index {} in column '{}'",
                        v, name
                    )));
                }
                None => {
                    return Err(ReefError::DataInconsistency(format!(
                        "missing row index in column '{}'",
                        name
                    )));
                }
            }
        }
        Ok(indices)
    }

    /// Check if a column is a datetime or date type
    pub fn is_datetime_column(&self, name: &str) -> bool {
        self.series(name)
            .map(|s| matches!(s.dtype(), DataType::Datetime(_, _) | DataType::Date))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_table_csv_loading() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "x,y,label").unwrap();
        writeln!(file, "1,2,a").unwrap();
        writeln!(file, "4,5,b").unwrap();
        writeln!(file, "7,8,a").unwrap();
        file.flush().unwrap();

        let table = Table::load(file.path()).unwrap();

        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 3);
        assert_eq!(table.column_names(), vec!["x", "y", "label"]);
        assert_eq!(table.column_as_f64("x").unwrap(), vec![1.0, 4.0, 7.0]);
        assert_eq!(
            table.column_as_string("label").unwrap(),
            vec!["a", "b", "a"]
        );
    }

    #[test]
    fn test_epoch_bumps_on_replace_only() {
        let df = DataFrame::new(vec![Series::new("x".into(), &[1.0, 2.0]).into()]).unwrap();
        let mut table = Table::new(df);
        let before = table.epoch();

        table
            .set_column(Series::new("reef:color:id".into(), &[0u32, 1u32]))
            .unwrap();
        assert_eq!(table.epoch(), before, "derived columns keep the epoch");

        let df2 = DataFrame::new(vec![Series::new("x".into(), &[3.0]).into()]).unwrap();
        table.replace(df2);
        assert!(table.epoch() > before);
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn test_column_as_indices_rejects_negative() {
        let df =
            DataFrame::new(vec![Series::new("source".into(), &[0i64, 2, -1]).into()]).unwrap();
        let table = Table::new(df);
        assert!(table.column_as_indices("source").is_err());

        let df = DataFrame::new(vec![Series::new("source".into(), &[0i64, 2, 1]).into()]).unwrap();
        let table = Table::new(df);
        assert_eq!(table.column_as_indices("source").unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn test_numeric_column_preserves_nulls_as_nan() {
        let values: Vec<Option<f64>> = vec![Some(1.0), None, Some(3.0)];
        let df = DataFrame::new(vec![Series::new("v".into(), values).into()]).unwrap();
        let table = Table::new(df);

        let out = table.column_as_f64("v").unwrap();
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 3.0);
    }
}
