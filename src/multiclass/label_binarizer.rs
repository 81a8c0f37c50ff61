use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{MultiviewError, Result};
use crate::helpers::helpers::unique_sorted;

/// The kind of target a [`LabelBinarizer`] was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    /// At most two distinct classes: a single indicator column, the positive
    /// class being the larger one.
    Binary,
    /// More than two classes: one indicator column per class.
    Multiclass,
    /// An indicator matrix: one column per label, any number of labels per
    /// sample.
    Multilabel,
}

/// Ordered mapping from class value to the samples carrying it.
///
/// Built once per fit; every indicator column handed to a sub-estimator is
/// derived from these index lists.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBinarizer {
    classes: Vec<usize>,
    target_type: TargetType,
    members: Vec<Vec<usize>>,
    n_samples: usize,
}

impl LabelBinarizer {
    pub fn fit(y: ArrayView1<usize>) -> Self {
        let classes = unique_sorted(y.iter().copied());
        let mut members = vec![Vec::new(); classes.len()];
        for (sample, label) in y.iter().enumerate() {
            if let Ok(k) = classes.binary_search(label) {
                members[k].push(sample);
            }
        }
        let target_type = if classes.len() > 2 {
            TargetType::Multiclass
        } else {
            TargetType::Binary
        };
        LabelBinarizer {
            classes,
            target_type,
            members,
            n_samples: y.len(),
        }
    }

    /// Binarizer of an indicator matrix whose column `k` flags the samples
    /// carrying label `k`.
    pub fn fit_indicator(Y: ArrayView2<bool>) -> Self {
        let members = Y
            .columns()
            .into_iter()
            .map(|column| {
                column
                    .iter()
                    .enumerate()
                    .filter(|&(_, &flag)| flag)
                    .map(|(sample, _)| sample)
                    .collect()
            })
            .collect();
        LabelBinarizer {
            classes: (0..Y.ncols()).collect(),
            target_type: TargetType::Multilabel,
            members,
            n_samples: Y.nrows(),
        }
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    /// Samples carrying the `k`-th class.
    pub fn members(&self, k: usize) -> &[usize] {
        &self.members[k]
    }

    /// Number of indicator columns, hence of one-vs-rest sub-estimators.
    pub fn n_columns(&self) -> usize {
        match self.target_type {
            TargetType::Binary => self.classes.len().saturating_sub(1),
            TargetType::Multiclass | TargetType::Multilabel => self.classes.len(),
        }
    }

    fn column_class(&self, column: usize) -> usize {
        match self.target_type {
            TargetType::Binary => column + 1,
            TargetType::Multiclass | TargetType::Multilabel => column,
        }
    }

    /// The `{0, 1}` indicator column `column`, aligned with the fitted rows.
    pub fn column(&self, column: usize) -> Array1<usize> {
        let mut indicator = Array1::zeros(self.n_samples);
        for &sample in self.members[self.column_class(column)].iter() {
            indicator[sample] = 1;
        }
        indicator
    }

    /// This method maps an indicator matrix, one column per sub-estimator,
    /// back to label sets:
    /// - binary targets give the positive class when flagged, the negative one
    ///   otherwise;
    /// - multiclass and multilabel targets give every flagged class.
    pub fn inverse_transform(&self, indicator: ArrayView2<bool>) -> Result<Vec<Vec<usize>>> {
        if indicator.ncols() != self.n_columns() {
            return Err(MultiviewError::ShapeMismatch {
                what: "indicator columns",
                expected: self.n_columns(),
                found: indicator.ncols(),
            });
        }
        let label_sets = indicator
            .rows()
            .into_iter()
            .map(|row| match self.target_type {
                TargetType::Binary => {
                    let positive = row.iter().any(|&flag| flag);
                    vec![self.classes[positive as usize]]
                }
                TargetType::Multiclass | TargetType::Multilabel => row
                    .iter()
                    .enumerate()
                    .filter(|&(_, &flag)| flag)
                    .map(|(column, _)| self.classes[self.column_class(column)])
                    .collect(),
            })
            .collect();
        Ok(label_sets)
    }
}
