use polars::prelude::*;

/// Statistics results
#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std_dev: 0.0,
            median: 0.0,
            min: 0.0,
            max: 0.0,
            count: 0,
        }
    }
}

/// Calculate comprehensive statistics from a Series using polars
pub fn calculate_stats(series: &Series) -> Stats {
    let count = series.len();

    if count == 0 {
        return Stats::default();
    }

    let series_f64 = match series.cast(&DataType::Float64) {
        Ok(s) => s,
        Err(_) => return Stats::default(),
    };

    let chunked = match series_f64.f64() {
        Ok(c) => c,
        Err(_) => return Stats::default(),
    };

    Stats {
        mean: chunked.mean().unwrap_or(0.0),
        std_dev: chunked.std(1).unwrap_or(0.0), // ddof=1 for sample std dev
        median: chunked.median().unwrap_or(0.0),
        min: chunked.min().unwrap_or(0.0),
        max: chunked.max().unwrap_or(0.0),
        count,
    }
}

/// Row of the statistics spreadsheet: the per-column summary of the current
/// selection, transposed so that each data column becomes one row.
#[derive(Debug, Clone, Default)]
pub struct Describe {
    pub count: usize,
    pub unique: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarize a slice of values. NaN entries (missing data) are skipped.
/// Quantiles use linear interpolation between the nearest ranks.
pub fn describe_values(values: &[f64]) -> Describe {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return Describe::default();
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let count = finite.len();
    let mean = finite.iter().sum::<f64>() / count as f64;
    let std_dev = if count > 1 {
        let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    let mut unique = 1;
    for pair in finite.windows(2) {
        if pair[0] != pair[1] {
            unique += 1;
        }
    }

    Describe {
        count,
        unique,
        mean,
        std_dev,
        min: finite[0],
        q25: quantile_sorted(&finite, 0.25),
        median: quantile_sorted(&finite, 0.5),
        q75: quantile_sorted(&finite, 0.75),
        max: finite[count - 1],
    }
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_stats() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let series = Series::new("test".into(), &data);
        let stats = calculate_stats(&series);

        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.count, 5);
    }

    #[test]
    fn test_empty_series() {
        let data: Vec<f64> = vec![];
        let series = Series::new("test".into(), &data);
        let stats = calculate_stats(&series);

        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_describe_values() {
        let desc = describe_values(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(desc.count, 5);
        assert_eq!(desc.unique, 5);
        assert_eq!(desc.mean, 3.0);
        assert_eq!(desc.median, 3.0);
        assert_eq!(desc.q25, 2.0);
        assert_eq!(desc.q75, 4.0);
        assert_eq!(desc.min, 1.0);
        assert_eq!(desc.max, 5.0);
    }

    #[test]
    fn test_describe_skips_nan_and_counts_unique() {
        let desc = describe_values(&[2.0, f64::NAN, 2.0, 4.0]);
        assert_eq!(desc.count, 3);
        assert_eq!(desc.unique, 2);
        assert_eq!(desc.min, 2.0);
        assert_eq!(desc.max, 4.0);
    }

    #[test]
    fn test_describe_all_nan() {
        let desc = describe_values(&[f64::NAN, f64::NAN]);
        assert_eq!(desc.count, 0);
    }
}
