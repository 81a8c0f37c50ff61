use ndarray::{Array2, Axis};
use ndarray_stats::QuantileExt;
use sprs::CsMat;

use super::ViewMatrix;
use crate::error::{MultiviewError, Result};
use crate::Float;

/// This implementation block provides shape queries and row/column selection
/// for both dense and sparse views. Index validation is done by the callers.
impl<F: Float> ViewMatrix<F> {
    pub fn nrows(&self) -> usize {
        match self {
            ViewMatrix::Dense(data) => data.nrows(),
            ViewMatrix::Sparse(data) => data.rows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            ViewMatrix::Dense(data) => data.ncols(),
            ViewMatrix::Sparse(data) => data.cols(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, ViewMatrix::Sparse(_))
    }

    pub fn to_dense(&self) -> Array2<F> {
        match self {
            ViewMatrix::Dense(data) => data.clone(),
            ViewMatrix::Sparse(data) => data.to_dense(),
        }
    }

    /// Rows are taken in the order of `indices`, duplicates included.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> ViewMatrix<F> {
        match self {
            ViewMatrix::Dense(data) => ViewMatrix::Dense(data.select(Axis(0), indices)),
            ViewMatrix::Sparse(data) => {
                let mut indptr = Vec::with_capacity(indices.len() + 1);
                let mut col_indices = Vec::new();
                let mut values = Vec::new();
                indptr.push(0);
                for &i in indices {
                    if let Some(row) = data.outer_view(i) {
                        col_indices.extend_from_slice(row.indices());
                        values.extend_from_slice(row.data());
                    }
                    indptr.push(col_indices.len());
                }
                ViewMatrix::Sparse(CsMat::new(
                    (indices.len(), data.cols()),
                    indptr,
                    col_indices,
                    values,
                ))
            }
        }
    }

    /// Columns are taken in the order of `indices`. For sparse views the
    /// indices must not contain duplicates.
    pub(crate) fn select_columns(&self, indices: &[usize]) -> ViewMatrix<F> {
        match self {
            ViewMatrix::Dense(data) => ViewMatrix::Dense(data.select(Axis(1), indices)),
            ViewMatrix::Sparse(data) => {
                let mut new_position = vec![None; data.cols()];
                for (position, &j) in indices.iter().enumerate() {
                    new_position[j] = Some(position);
                }

                let mut indptr = Vec::with_capacity(data.rows() + 1);
                let mut col_indices = Vec::new();
                let mut values = Vec::new();
                indptr.push(0);
                for row in data.outer_iterator() {
                    let mut entries = row
                        .iter()
                        .filter_map(|(j, &value)| new_position[j].map(|p| (p, value)))
                        .collect::<Vec<_>>();
                    entries.sort_by_key(|&(p, _)| p);
                    for (p, value) in entries {
                        col_indices.push(p);
                        values.push(value);
                    }
                    indptr.push(col_indices.len());
                }
                ViewMatrix::Sparse(CsMat::new(
                    (data.rows(), indices.len()),
                    indptr,
                    col_indices,
                    values,
                ))
            }
        }
    }

    /// This method computes the `(n_features, 2)` matrix of per-feature
    /// minimum and maximum values. Implicit zeros of sparse views count as
    /// values. An empty view has null limits.
    pub(crate) fn feature_limits(&self) -> Result<Array2<F>> {
        let n_features = self.ncols();
        let mut limits = Array2::zeros((n_features, 2));
        if self.nrows() == 0 {
            return Ok(limits);
        }
        let dense = self.to_dense();
        for (j, column) in dense.axis_iter(Axis(1)).enumerate() {
            let min = column.min().map_err(|err| {
                MultiviewError::Configuration(format!("feature {} has no minimum: {}", j, err))
            })?;
            let max = column.max().map_err(|err| {
                MultiviewError::Configuration(format!("feature {} has no maximum: {}", j, err))
            })?;
            limits[[j, 0]] = *min;
            limits[[j, 1]] = *max;
        }
        Ok(limits)
    }
}
