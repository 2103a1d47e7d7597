//! Per-column standardization.
//!
//! Raw embedding magnitudes are not comparable across dimensions, so every
//! matrix is rescaled to zero mean and unit variance per column before
//! partitioning.

use ndarray::Array2;

use crate::error::{Error, Result};

/// Standardize each column of `data` to zero mean and unit variance.
///
/// Constant columns (zero standard deviation) are mapped to all-zeros
/// rather than dividing by zero. Rows must share one dimension.
pub fn standardize(data: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    let n = data.len();
    let d = data[0].len();
    let mut flat: Vec<f32> = Vec::with_capacity(n * d);
    for row in data {
        if row.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: row.len(),
            });
        }
        flat.extend(row);
    }
    let mut matrix = Array2::from_shape_vec((n, d), flat).expect("row-major buffer matches (n, d)");

    for j in 0..d {
        let col = matrix.column(j);
        let mean = col.sum() / n as f32;
        let var = col.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n as f32;
        let std = var.sqrt();

        let mut col = matrix.column_mut(j);
        if std > 0.0 {
            col.mapv_inplace(|x| (x - mean) / std);
        } else {
            col.fill(0.0);
        }
    }

    Ok(matrix.outer_iter().map(|row| row.to_vec()).collect())
}
