//! Index-addressable multiview datasets.
//!
//! A [`MultiviewDataset`] is an ordered sequence of [`View`]s sharing the same
//! rows, a label vector aligned with those rows, a label-name table and a few
//! pieces of metadata. Every consumer addresses a logical slice of the dataset
//! through optional sample and view index sequences, resolved by
//! [`MultiviewDataset::resolve_indices`].

use std::collections::HashMap;

use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use sprs::CsMat;

use crate::error::{IndexKind, MultiviewError, Result};
use crate::helpers::helpers::unique_sorted;
use crate::Float;


mod impl_noise;
mod impl_selection;
mod impl_view_matrix;
pub mod store;

pub use impl_noise::{NoiseParams, NoiseValidParams};

/// The storage of a single view: a dense matrix, or a CSR sparse matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewMatrix<F> {
    Dense(Array2<F>),
    Sparse(CsMat<F>),
}

/// One modality of a multiview dataset.
///
/// Besides its data and name, a view carries per-feature limits, a
/// `(n_features, 2)` matrix whose columns are the minimum and maximum value
/// each feature can take. They bound the noise injected by
/// [`MultiviewDataset::add_gaussian_noise`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View<F> {
    name: String,
    data: ViewMatrix<F>,
    limits: Array2<F>,
}

impl<F: Float> View<F> {
    /// This method creates a dense view. Feature limits are computed from the
    /// data.
    pub fn dense(name: impl Into<String>, data: Array2<F>) -> Result<Self> {
        Self::from_matrix(name, ViewMatrix::Dense(data))
    }

    /// This method creates a sparse view. The matrix is stored in CSR layout,
    /// so a CSC input is converted first.
    pub fn sparse(name: impl Into<String>, data: CsMat<F>) -> Result<Self> {
        let data = if data.is_csr() { data } else { data.to_csr() };
        Self::from_matrix(name, ViewMatrix::Sparse(data))
    }

    fn from_matrix(name: impl Into<String>, data: ViewMatrix<F>) -> Result<Self> {
        let limits = data.feature_limits()?;
        Ok(View {
            name: name.into(),
            data,
            limits,
        })
    }

    /// This method replaces the computed feature limits with user-supplied
    /// ones.
    pub fn with_limits(mut self, limits: Array2<F>) -> Result<Self> {
        if limits.nrows() != self.data.ncols() {
            return Err(MultiviewError::ShapeMismatch {
                what: "view limits rows",
                expected: self.data.ncols(),
                found: limits.nrows(),
            });
        }
        if limits.ncols() != 2 {
            return Err(MultiviewError::ShapeMismatch {
                what: "view limits columns",
                expected: 2,
                found: limits.ncols(),
            });
        }
        self.limits = limits;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self.data, ViewMatrix::Sparse(_))
    }

    pub fn data(&self) -> &ViewMatrix<F> {
        &self.data
    }

    pub fn limits(&self) -> ArrayView2<F> {
        self.limits.view()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.data.nrows(), self.data.ncols())
    }

    pub(crate) fn with_data(&self, data: ViewMatrix<F>, limits: Array2<F>) -> Self {
        View {
            name: self.name.clone(),
            data,
            limits,
        }
    }
}

/// A multiview dataset
///
/// Invariants, checked on construction and on load:
/// - every view has as many rows as there are labels;
/// - view names are unique;
/// - every label value indexes the label-name table;
/// - there is one sample id per sample.
///
/// Label values are not required to cover the whole table: a name may have no
/// sample, as after filtering on a label absent from the kept samples.
/// [`MultiviewDataset::get_nb_class`] counts the values actually present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiviewDataset<F> {
    name: Option<String>,
    views: Vec<View<F>>,
    labels: Array1<usize>,
    label_names: Vec<String>,
    sample_ids: Vec<String>,
}

impl<F: Float> MultiviewDataset<F> {
    /// This method instantiates a dataset from in-memory views, a label vector
    /// and the label-name table. Sample ids default to `ID_<i>`.
    pub fn new(views: Vec<View<F>>, labels: Array1<usize>, label_names: Vec<String>) -> Result<Self> {
        let sample_ids = (0..labels.len()).map(|i| format!("ID_{}", i)).collect();
        let dataset = MultiviewDataset {
            name: None,
            views,
            labels,
            label_names,
            sample_ids,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// This method instantiates a dense dataset from raw arrays, naming views
    /// `View<i>` and labels after their value.
    pub fn from_arrays(views: Vec<Array2<F>>, labels: Array1<usize>) -> Result<Self> {
        let n_labels = labels.iter().max().map_or(0, |&max| max + 1);
        let views = views
            .into_iter()
            .enumerate()
            .map(|(index, data)| View::dense(format!("View{}", index), data))
            .collect::<Result<Vec<_>>>()?;
        let label_names = (0..n_labels).map(|label| label.to_string()).collect();
        Self::new(views, labels, label_names)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sample_ids(mut self, sample_ids: Vec<String>) -> Result<Self> {
        if sample_ids.len() != self.labels.len() {
            return Err(MultiviewError::ShapeMismatch {
                what: "sample ids",
                expected: self.labels.len(),
                found: sample_ids.len(),
            });
        }
        self.sample_ids = sample_ids;
        Ok(self)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let nb_samples = self.labels.len();
        for view in self.views.iter() {
            if view.data.nrows() != nb_samples {
                return Err(MultiviewError::ShapeMismatch {
                    what: "view rows",
                    expected: nb_samples,
                    found: view.data.nrows(),
                });
            }
            if view.limits.nrows() != view.data.ncols() {
                return Err(MultiviewError::ShapeMismatch {
                    what: "view limits rows",
                    expected: view.data.ncols(),
                    found: view.limits.nrows(),
                });
            }
        }
        for (index, view) in self.views.iter().enumerate() {
            if self.views[..index].iter().any(|other| other.name == view.name) {
                return Err(MultiviewError::Configuration(format!(
                    "duplicated view name {:?}",
                    view.name
                )));
            }
        }
        if let Some(&label) = self.labels.iter().find(|&&l| l >= self.label_names.len()) {
            return Err(MultiviewError::out_of_range(
                IndexKind::Label,
                label,
                self.label_names.len(),
            ));
        }
        if self.sample_ids.len() != nb_samples {
            return Err(MultiviewError::ShapeMismatch {
                what: "sample ids",
                expected: nb_samples,
                found: self.sample_ids.len(),
            });
        }
        Ok(())
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn get_nb_view(&self) -> usize {
        self.views.len()
    }

    pub fn get_nb_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn views(&self) -> &[View<F>] {
        &self.views
    }

    pub fn view(&self, view_index: usize) -> Result<&View<F>> {
        self.views
            .get(view_index)
            .ok_or_else(|| MultiviewError::out_of_range(IndexKind::View, view_index, self.views.len()))
    }

    pub fn get_view_name(&self, view_index: usize) -> Result<&str> {
        Ok(self.view(view_index)?.name())
    }

    /// Name to index mapping of the views.
    pub fn get_view_dict(&self) -> HashMap<String, usize> {
        self.views
            .iter()
            .enumerate()
            .map(|(index, view)| (view.name.clone(), index))
            .collect()
    }

    pub fn view_index(&self, view_name: &str) -> Result<usize> {
        self.views
            .iter()
            .position(|view| view.name == view_name)
            .ok_or_else(|| MultiviewError::UnknownView(view_name.to_string()))
    }

    pub fn get_shape(&self, view_index: usize) -> Result<(usize, usize)> {
        Ok(self.view(view_index)?.shape())
    }

    pub fn is_sparse(&self, view_index: usize) -> Result<bool> {
        Ok(self.view(view_index)?.is_sparse())
    }

    /// The full label-name table, indexed by label value.
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn init_sample_indices(&self, sample_indices: Option<&[usize]>) -> Vec<usize> {
        match sample_indices {
            Some(indices) => indices.to_vec(),
            None => (0..self.get_nb_samples()).collect(),
        }
    }

    pub fn init_view_indices(&self, view_indices: Option<&[usize]>) -> Vec<usize> {
        match view_indices {
            Some(indices) => indices.to_vec(),
            None => (0..self.get_nb_view()).collect(),
        }
    }

    /// This method resolves optional sample and view index sequences into
    /// concrete ones: a missing argument stands for the full ordered range.
    /// Every index is checked against the dataset bounds.
    pub fn resolve_indices(
        &self,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<(Vec<usize>, Vec<usize>)> {
        let sample_indices = self.init_sample_indices(sample_indices);
        check_bounds(&sample_indices, IndexKind::Sample, self.get_nb_samples())?;
        let view_indices = self.init_view_indices(view_indices);
        check_bounds(&view_indices, IndexKind::View, self.get_nb_view())?;
        Ok((sample_indices, view_indices))
    }

    /// This method returns the matrix of a view restricted to the given rows.
    pub fn get_view(&self, view_index: usize, sample_indices: Option<&[usize]>) -> Result<ViewMatrix<F>> {
        let view = self.view(view_index)?;
        match sample_indices {
            None => Ok(view.data.clone()),
            Some(indices) => {
                check_bounds(indices, IndexKind::Sample, self.get_nb_samples())?;
                Ok(view.data.select_rows(indices))
            }
        }
    }

    /// Same as [`MultiviewDataset::get_view`], densifying sparse views.
    pub fn get_view_dense(&self, view_index: usize, sample_indices: Option<&[usize]>) -> Result<Array2<F>> {
        Ok(self.get_view(view_index, sample_indices)?.to_dense())
    }

    pub fn get_labels(&self, sample_indices: Option<&[usize]>) -> Result<Array1<usize>> {
        match sample_indices {
            None => Ok(self.labels.clone()),
            Some(indices) => {
                check_bounds(indices, IndexKind::Sample, self.get_nb_samples())?;
                Ok(indices.iter().map(|&i| self.labels[i]).collect())
            }
        }
    }

    /// Number of distinct labels among the given samples.
    pub fn get_nb_class(&self, sample_indices: Option<&[usize]>) -> Result<usize> {
        let labels = self.get_labels(sample_indices)?;
        Ok(unique_sorted(labels.iter().copied()).len())
    }

    /// Names of the distinct labels present among the given samples, in label
    /// order.
    pub fn get_label_names(&self, sample_indices: Option<&[usize]>) -> Result<Vec<String>> {
        let labels = self.get_labels(sample_indices)?;
        Ok(unique_sorted(labels.iter().copied())
            .into_iter()
            .map(|label| self.label_names[label].clone())
            .collect())
    }

    pub fn get_sample_ids(&self, sample_indices: Option<&[usize]>) -> Result<Vec<String>> {
        let sample_indices = self.init_sample_indices(sample_indices);
        check_bounds(&sample_indices, IndexKind::Sample, self.get_nb_samples())?;
        Ok(sample_indices
            .iter()
            .map(|&i| self.sample_ids[i].clone())
            .collect())
    }

    /// This method stacks the selected views horizontally into a single dense
    /// matrix. The second output holds the column limits of each view in the
    /// stacked matrix: view `k` spans columns `limits[k]..limits[k + 1]`.
    pub fn to_concatenated_array(
        &self,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<(Array2<F>, Vec<usize>)> {
        let (sample_indices, view_indices) = self.resolve_indices(sample_indices, view_indices)?;
        let blocks = view_indices
            .iter()
            .map(|&v| self.get_view_dense(v, Some(&sample_indices)))
            .collect::<Result<Vec<_>>>()?;

        let mut limits = Vec::with_capacity(blocks.len() + 1);
        limits.push(0);
        for block in blocks.iter() {
            limits.push(limits[limits.len() - 1] + block.ncols());
        }

        if blocks.is_empty() {
            return Ok((Array2::zeros((sample_indices.len(), 0)), limits));
        }
        let block_views = blocks.iter().map(|block| block.view()).collect::<Vec<_>>();
        let stacked = concatenate(Axis(1), &block_views).map_err(|_| MultiviewError::ShapeMismatch {
            what: "stacked view rows",
            expected: sample_indices.len(),
            found: blocks.iter().map(|block| block.nrows()).max().unwrap_or(0),
        })?;
        Ok((stacked, limits))
    }
}

pub(crate) fn check_bounds(indices: &[usize], kind: IndexKind, len: usize) -> Result<()> {
    match indices.iter().find(|&&index| index >= len) {
        Some(&index) => Err(MultiviewError::out_of_range(kind, index, len)),
        None => Ok(()),
    }
}
