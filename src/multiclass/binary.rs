use log::warn;
use ndarray::{Array1, ArrayView1};

use crate::datasets::MultiviewDataset;
use crate::error::{MultiviewError, Result};
use crate::estimators::MultiviewEstimator;
use crate::Float;

/// This function fits an independent clone of `estimator` on the given
/// samples and views. The original estimator is left untouched.
pub fn fit_binary<F: Float, E: MultiviewEstimator<F>>(
    estimator: &E,
    X: &MultiviewDataset<F>,
    y: ArrayView1<usize>,
    train_indices: &[usize],
    view_indices: &[usize],
) -> Result<E> {
    let mut estimator = estimator.clone();
    estimator.fit(X, y, Some(train_indices), Some(view_indices))?;
    Ok(estimator)
}

/// This function scores the selected samples with a fitted binary estimator
/// and returns the scores together with the threshold above which a score
/// predicts the positive class.
///
/// Regressors return their predictions, thresholded at `0.5`. Classifiers
/// return their margin, thresholded at `0`, when they have one, and the
/// probability of the positive class, thresholded at `0.5`, otherwise. A
/// margin failing with [`MultiviewError::Capability`] falls back to the
/// probability; any other error is returned as is.
pub fn predict_binary<F: Float, E: MultiviewEstimator<F>>(
    estimator: &E,
    X: &MultiviewDataset<F>,
    sample_indices: &[usize],
    view_indices: &[usize],
) -> Result<(Array1<F>, F)> {
    let capabilities = estimator.capabilities();
    if capabilities.regressor {
        let values = estimator.predict_values(X, Some(sample_indices), Some(view_indices))?;
        return Ok((values, F::cast(0.5)));
    }
    if capabilities.margin {
        match estimator.decision_function(X, Some(sample_indices), Some(view_indices)) {
            Err(MultiviewError::Capability { estimator: name, .. }) => {
                warn!("{} has no usable margin, scoring with probabilities", name);
            }
            scores => return Ok((scores?, F::zero())),
        }
    }

    let proba = estimator.predict_proba(X, Some(sample_indices), Some(view_indices))?;
    if proba.ncols() < 2 {
        return Err(MultiviewError::ShapeMismatch {
            what: "probability columns",
            expected: 2,
            found: proba.ncols(),
        });
    }
    Ok((proba.column(1).to_owned(), F::cast(0.5)))
}
