//! Dimensionality reduction
//!
//! The embedding view treats the reduction algorithm as a pluggable
//! `Reducer` capability: dense matrix in, per-row coordinates out. A PCA
//! implementation ships with the engine; neighbor-embedding methods plug in
//! through the same trait and declare whether they need standardized input.

use crate::error::{ReefError, Result};

/// Dense row-major matrix of the selected feature columns
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from column vectors. All columns must have the same length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let cols = columns.len();
        if cols == 0 {
            return Err(ReefError::EmptyDataset);
        }
        let rows = columns[0].len();
        if columns.iter().any(|c| c.len() != rows) {
            return Err(ReefError::DataInconsistency(
                "feature columns differ in length".to_string(),
            ));
        }

        let mut m = Self::zeros(rows, cols);
        for (c, column) in columns.iter().enumerate() {
            for (r, &v) in column.iter().enumerate() {
                m.set(r, c, v);
            }
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    pub fn has_missing(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }
}

/// Shift every column to zero mean and unit variance. A zero-variance
/// column divides by 1.0 instead, leaving it centered at zero.
pub fn standardize(matrix: &Matrix) -> Matrix {
    let mut out = matrix.clone();
    for c in 0..matrix.cols() {
        let column = matrix.column(c);
        let n = column.len() as f64;
        let mean = column.iter().sum::<f64>() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = if var > 0.0 { var.sqrt() } else { 1.0 };
        for r in 0..matrix.rows() {
            out.set(r, c, (matrix.get(r, c) - mean) / std);
        }
    }
    out
}

/// Result of a reduction
pub struct Embedding {
    /// n_rows x n_components coordinates
    pub coordinates: Matrix,
    /// Fraction of total variance captured per component, when the method
    /// defines one (PCA does, neighbor embeddings do not)
    pub explained_variance_ratio: Option<Vec<f64>>,
}

pub trait Reducer {
    fn name(&self) -> &'static str;

    /// True when the method's contract requires standardized input; the
    /// aggregator standardizes before calling `fit_transform` in that case.
    fn requires_standardization(&self) -> bool;

    fn fit_transform(&mut self, matrix: &Matrix, n_components: usize) -> Result<Embedding>;
}

/// Principal component analysis via the covariance matrix and a cyclic
/// Jacobi eigensolver. Deterministic; component signs are fixed so that
/// each eigenvector's largest entry is positive.
pub struct PcaReducer;

impl Reducer for PcaReducer {
    fn name(&self) -> &'static str {
        "pca"
    }

    fn requires_standardization(&self) -> bool {
        false
    }

    fn fit_transform(&mut self, matrix: &Matrix, n_components: usize) -> Result<Embedding> {
        let (rows, cols) = (matrix.rows(), matrix.cols());
        if rows < 2 {
            return Err(ReefError::EmptyDataset);
        }
        let n_components = n_components.min(cols).max(1);

        // Center the columns.
        let means: Vec<f64> = (0..cols)
            .map(|c| matrix.column(c).iter().sum::<f64>() / rows as f64)
            .collect();
        let mut centered = matrix.clone();
        for r in 0..rows {
            for c in 0..cols {
                centered.set(r, c, matrix.get(r, c) - means[c]);
            }
        }

        // Sample covariance matrix.
        let mut cov = vec![vec![0.0f64; cols]; cols];
        for i in 0..cols {
            for j in i..cols {
                let mut sum = 0.0;
                for r in 0..rows {
                    sum += centered.get(r, i) * centered.get(r, j);
                }
                let v = sum / (rows - 1) as f64;
                cov[i][j] = v;
                cov[j][i] = v;
            }
        }

        let (eigenvalues, eigenvectors) = jacobi_eigen(cov);

        // Order components by descending eigenvalue.
        let mut order: Vec<usize> = (0..cols).collect();
        order.sort_by(|&a, &b| eigenvalues[b].partial_cmp(&eigenvalues[a]).unwrap());

        let total: f64 = eigenvalues.iter().map(|&v| v.max(0.0)).sum();
        let ratios: Vec<f64> = order
            .iter()
            .take(n_components)
            .map(|&i| {
                if total > 0.0 {
                    eigenvalues[i].max(0.0) / total
                } else {
                    0.0
                }
            })
            .collect();

        // Project onto the leading components.
        let mut coordinates = Matrix::zeros(rows, n_components);
        for (k, &comp) in order.iter().take(n_components).enumerate() {
            let axis = fixed_sign(column_of(&eigenvectors, comp));
            for r in 0..rows {
                let mut sum = 0.0;
                for c in 0..cols {
                    sum += centered.get(r, c) * axis[c];
                }
                coordinates.set(r, k, sum);
            }
        }

        Ok(Embedding {
            coordinates,
            explained_variance_ratio: Some(ratios),
        })
    }
}

fn column_of(matrix: &[Vec<f64>], col: usize) -> Vec<f64> {
    matrix.iter().map(|row| row[col]).collect()
}

fn fixed_sign(mut axis: Vec<f64>) -> Vec<f64> {
    let dominant = axis
        .iter()
        .cloned()
        .max_by(|a, b| a.abs().partial_cmp(&b.abs()).unwrap())
        .unwrap_or(1.0);
    if dominant < 0.0 {
        for v in &mut axis {
            *v = -*v;
        }
    }
    axis
}

/// Cyclic Jacobi rotation for a symmetric matrix. Returns the eigenvalues
/// and the matrix whose columns are the corresponding eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v = vec![vec![0.0f64; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..100 {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[p][q] * a[p][q];
            }
        }
        if off < 1e-18 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-15 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[k][p];
                    let vkq = v[k][q];
                    v[k][p] = c * vkp - s * vkq;
                    v[k][q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_from_columns_checks_lengths() {
        assert!(Matrix::from_columns(&[]).is_err());
        assert!(Matrix::from_columns(&[vec![1.0, 2.0], vec![1.0]]).is_err());

        let m = Matrix::from_columns(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.get(1, 0), 2.0);
        assert_eq!(m.get(0, 1), 3.0);
    }

    #[test]
    fn test_standardize_unit_variance() {
        let m = Matrix::from_columns(&[vec![1.0, 2.0, 3.0], vec![5.0, 5.0, 5.0]]).unwrap();
        let s = standardize(&m);

        let col = s.column(0);
        let mean: f64 = col.iter().sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        let var: f64 = col.iter().map(|v| v * v).sum::<f64>() / 3.0;
        assert!((var - 1.0).abs() < 1e-12);

        // zero variance column stays centered, no division by zero
        assert_eq!(s.column(1), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pca_collinear_data() {
        // Points on the line y = 2x: one component carries all variance.
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        let m = Matrix::from_columns(&[x, y]).unwrap();

        let embedding = PcaReducer.fit_transform(&m, 2).unwrap();
        let ratios = embedding.explained_variance_ratio.unwrap();

        assert!((ratios[0] - 1.0).abs() < 1e-9);
        assert!(ratios[1].abs() < 1e-9);
        assert!((ratios.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pca_components_uncorrelated() {
        let x = vec![2.5, 0.5, 2.2, 1.9, 3.1, 2.3, 2.0, 1.0, 1.5, 1.1];
        let y = vec![2.4, 0.7, 2.9, 2.2, 3.0, 2.7, 1.6, 1.1, 1.6, 0.9];
        let m = Matrix::from_columns(&[x, y]).unwrap();

        let embedding = PcaReducer.fit_transform(&m, 2).unwrap();
        let c0 = embedding.coordinates.column(0);
        let c1 = embedding.coordinates.column(1);

        let dot: f64 = c0.iter().zip(&c1).map(|(a, b)| a * b).sum();
        assert!(dot.abs() < 1e-9, "projections must be uncorrelated");

        let var0: f64 = c0.iter().map(|v| v * v).sum();
        let var1: f64 = c1.iter().map(|v| v * v).sum();
        assert!(var0 >= var1, "components ordered by variance");
    }

    #[test]
    fn test_pca_deterministic() {
        let m = Matrix::from_columns(&[vec![1.0, 4.0, 2.0], vec![7.0, 3.0, 5.0]]).unwrap();
        let a = PcaReducer.fit_transform(&m, 1).unwrap();
        let b = PcaReducer.fit_transform(&m, 1).unwrap();
        assert_eq!(a.coordinates.column(0), b.coordinates.column(0));
    }
}
