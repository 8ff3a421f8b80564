//! 2-D tensor wrapper over `ndarray`.
//!
//! The engine works in `f64` throughout. Layer inputs and outputs follow the
//! column-vector convention: a vector of `n` values is a tensor of shape
//! `(n, 1)`. The tensor itself carries no arithmetic operators — all math
//! lives in the layer or activation that consumes the underlying array.

use ndarray::Array2;

use crate::errors::{NetError, NetResult};

/// A rectangular grid of `f64` values with shape `(rows, cols)`.
///
/// Mutable contents, immutable identity: a unit that retains a tensor across
/// calls (e.g. a cached forward input) owns its own clone and treats it as
/// stable until the next forward pass overwrites it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array2<f64>,
}

impl Tensor {
    /// Wrap an existing 2-D array.
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Create a zero-filled tensor of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> NetResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(NetError::Shape(format!(
                "tensor shape must be non-zero in both dimensions, got ({rows}, {cols})"
            )));
        }
        Ok(Self {
            data: Array2::zeros((rows, cols)),
        })
    }

    /// Build a tensor from explicit row data.
    ///
    /// Ragged input (rows of unequal length) and empty input are rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> NetResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(NetError::Shape(
                "tensor requires at least one row and one column".to_string(),
            ));
        }
        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(NetError::Shape(format!(
                    "row {i} has {} columns, expected {n_cols}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }
        let data = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| NetError::Shape(format!("failed to build tensor: {e}")))?;
        Ok(Self { data })
    }

    /// Build a column vector of shape `(values.len(), 1)`.
    pub fn column(values: &[f64]) -> NetResult<Self> {
        if values.is_empty() {
            return Err(NetError::Shape(
                "column vector requires at least one value".to_string(),
            ));
        }
        let data = Array2::from_shape_vec((values.len(), 1), values.to_vec())
            .map_err(|e| NetError::Shape(format!("failed to build column: {e}")))?;
        Ok(Self { data })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Whether this tensor is a column vector `(n, 1)`.
    pub fn is_column(&self) -> bool {
        self.cols() == 1
    }

    /// Value at `(row, col)`, or `None` if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// Immutable view of the underlying array.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Mutable view of the underlying array. Used by the optimizer for
    /// in-place parameter updates.
    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Whether any element is NaN or infinite.
    pub fn has_invalid_values(&self) -> bool {
        self.data.iter().any(|x| !x.is_finite())
    }
}
