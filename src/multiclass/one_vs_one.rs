use std::borrow::Cow;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::binary::{fit_binary, predict_binary};
use super::hyperparams::{DecompositionParams, DecompositionValidParams};
use super::{fan_out, resolve_decomposition_indices};
use crate::datasets::MultiviewDataset;
use crate::error::{MultiviewError, Result};
use crate::estimators::{check_labels, Capabilities, MultiviewEstimator};
use crate::helpers::helpers::{first_argmax, intersect_sorted, unique_sorted};
use crate::param_guard::ParamGuard;
use crate::Float;

/// One-vs-One decomposition
///
/// One binary estimator is trained per pair of classes `(i, j)`, `i < j`, on
/// the training samples of those two classes only; class `i` is relabeled `0`
/// and class `j` is relabeled `1`. At prediction time, every pair votes for
/// one of its two classes and the votes are combined with the pair scores by
/// [`pairwise_decision_function`]. On ties, the smallest class wins.
///
/// When the wrapped estimator has the `pairwise` capability (precomputed
/// kernel views), the training samples of each pair are recorded and the
/// feature columns of the views are restricted to them when scoring that pair.
#[derive(Debug, Clone)]
pub struct OneVsOne<E> {
    estimator: E,
    params: DecompositionValidParams,
    classes: Vec<usize>,
    estimators: Vec<E>,
    pairwise_indices: Option<Vec<Vec<usize>>>,
}

impl<E> OneVsOne<E> {
    /// Creates an unfitted decomposition with default parameters
    pub fn new(estimator: E) -> Self {
        OneVsOne {
            estimator,
            params: DecompositionValidParams::default(),
            classes: Vec::new(),
            estimators: Vec::new(),
            pairwise_indices: None,
        }
    }

    /// Creates an unfitted decomposition, checking the parameters first
    pub fn with_params(estimator: E, params: DecompositionParams) -> Result<Self> {
        Ok(OneVsOne {
            params: params.check()?,
            ..Self::new(estimator)
        })
    }

    pub(crate) fn from_valid_params(estimator: E, params: DecompositionValidParams) -> Self {
        OneVsOne {
            params,
            ..Self::new(estimator)
        }
    }

    pub fn params() -> DecompositionParams {
        DecompositionParams::new()
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Fitted sub-estimators, in `(0, 1), (0, 2), .., (1, 2), ..` pair order.
    pub fn estimators(&self) -> &[E] {
        &self.estimators
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Training samples of every pair, recorded for pairwise estimators only.
    pub fn pairwise_indices(&self) -> Option<&[Vec<usize>]> {
        self.pairwise_indices.as_deref()
    }

    pub fn is_fitted(&self) -> bool {
        !self.estimators.is_empty()
    }

    fn check_is_fitted(&self) -> Result<()> {
        if self.is_fitted() {
            Ok(())
        } else {
            Err(MultiviewError::NotFitted("OneVsOne"))
        }
    }

    /// Scores of the `k`-th pair estimator and their threshold, restricting the
    /// view columns to the pair training samples when they were recorded.
    fn pair_scores<F>(
        &self,
        k: usize,
        X: &MultiviewDataset<F>,
        sample_indices: &[usize],
        view_indices: &[usize],
    ) -> Result<(Array1<F>, F)>
    where
        F: Float,
        E: MultiviewEstimator<F>,
    {
        let columns = self.pairwise_indices.as_ref().map(|indices| &indices[k][..]);
        let X = restrict_columns(X, columns)?;
        let (scores, threshold) =
            predict_binary(&self.estimators[k], &*X, sample_indices, view_indices)?;
        if scores.len() != sample_indices.len() {
            return Err(MultiviewError::ShapeMismatch {
                what: "binary scores",
                expected: sample_indices.len(),
                found: scores.len(),
            });
        }
        Ok((scores, threshold))
    }

    /// This method returns the aggregated score of every class for the
    /// selected samples, one row per sample and one column per class. The
    /// predicted class is the first maximum of each row.
    pub fn decision_matrix<F>(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array2<F>>
    where
        F: Float,
        E: MultiviewEstimator<F>,
    {
        self.check_is_fitted()?;
        let (sample_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;

        let mut predictions = Array2::<usize>::zeros((sample_indices.len(), self.estimators.len()));
        let mut confidences = Array2::<F>::zeros((sample_indices.len(), self.estimators.len()));
        for k in 0..self.estimators.len() {
            let (scores, threshold) = self.pair_scores(k, X, &sample_indices, &view_indices)?;
            predictions
                .column_mut(k)
                .assign(&scores.mapv(|score| (score > threshold) as usize));
            confidences.column_mut(k).assign(&scores);
        }
        pairwise_decision_function(predictions.view(), confidences.view(), self.n_classes())
    }
}

/// Views of `X` restricted to the given columns, or `X` itself.
fn restrict_columns<'a, F: Float>(
    X: &'a MultiviewDataset<F>,
    columns: Option<&[usize]>,
) -> Result<Cow<'a, MultiviewDataset<F>>> {
    Ok(match columns {
        Some(columns) => Cow::Owned(X.select_features(columns)?),
        None => Cow::Borrowed(X),
    })
}

/// Class pairs `(i, j)` with `i < j`, in lexicographic order.
pub(crate) fn class_pairs(n_classes: usize) -> Vec<(usize, usize)> {
    (0..n_classes)
        .flat_map(|i| (i + 1..n_classes).map(move |j| (i, j)))
        .collect()
}

/// This function reduces pairwise outcomes to one score per class.
///
/// Column `k` of `predictions` and `confidences` belongs to the `k`-th pair
/// `(i, j)` of [`class_pairs`]. A prediction of `0` is a vote for `i`, `1` a
/// vote for `j`; the confidence is subtracted from `i` and added to `j`. The
/// summed confidences are squashed into `(-1/3, 1/3)` by
/// ```ignore
/// c / (3 * (|c| + 1))
/// ```
/// and added to the votes, so that they only break ties between vote counts.
pub fn pairwise_decision_function<F: Float>(
    predictions: ArrayView2<usize>,
    confidences: ArrayView2<F>,
    n_classes: usize,
) -> Result<Array2<F>> {
    let pairs = class_pairs(n_classes);
    if predictions.ncols() != pairs.len() || confidences.dim() != predictions.dim() {
        return Err(MultiviewError::ShapeMismatch {
            what: "pairwise columns",
            expected: pairs.len(),
            found: predictions.ncols(),
        });
    }
    let n_samples = predictions.nrows();
    let mut votes = Array2::<F>::zeros((n_samples, n_classes));
    let mut sum_of_confidences = Array2::<F>::zeros((n_samples, n_classes));
    for (k, &(i, j)) in pairs.iter().enumerate() {
        for s in 0..n_samples {
            let confidence = confidences[[s, k]];
            sum_of_confidences[[s, i]] -= confidence;
            sum_of_confidences[[s, j]] += confidence;
            match predictions[[s, k]] {
                0 => votes[[s, i]] += F::one(),
                1 => votes[[s, j]] += F::one(),
                _ => {}
            }
        }
    }
    let three = F::cast(3.);
    Ok(votes + sum_of_confidences.mapv(|c| c / (three * (c.abs() + F::one()))))
}

impl<F: Float, E: MultiviewEstimator<F>> MultiviewEstimator<F> for OneVsOne<E> {
    fn name(&self) -> String {
        format!("ovo_{}", self.estimator.name())
    }

    fn capabilities(&self) -> Capabilities {
        let inner = self.estimator.capabilities();
        Capabilities {
            margin: true,
            probability: false,
            multiclass: true,
            pairwise: inner.pairwise,
            regressor: false,
        }
    }

    fn fit(
        &mut self,
        X: &MultiviewDataset<F>,
        y: ArrayView1<usize>,
        train_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<()> {
        self.classes.clear();
        self.estimators.clear();
        self.pairwise_indices = None;
        check_labels(X, y)?;
        let (train_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, train_indices, view_indices)?;

        let classes = unique_sorted(y.iter().copied());
        if classes.len() < 2 {
            return Err(MultiviewError::Configuration(
                "one-vs-one can not be fit when only one class is present".to_string(),
            ));
        }

        let pairs = class_pairs(classes.len());
        let n_pairs = pairs.len();
        let pairwise = self.estimator.capabilities().pairwise;
        let fitted = fan_out(self.params.n_jobs(), pairs, |(i, j)| {
            let (class_i, class_j) = (classes[i], classes[j]);
            let members = y
                .iter()
                .enumerate()
                .filter(|&(_, &label)| label == class_i || label == class_j)
                .map(|(sample, _)| sample)
                .collect::<Vec<_>>();
            let pair_train_indices = intersect_sorted(&train_indices, &members);
            let y_binary = y.mapv(|label| (label == class_j) as usize);
            let pair_X = restrict_columns(X, pairwise.then(|| &pair_train_indices[..]))?;
            let estimator = fit_binary(
                &self.estimator,
                &*pair_X,
                y_binary.view(),
                &pair_train_indices,
                &view_indices,
            )?;
            debug!(
                "fitted one-vs-one {} for classes ({}, {}) on {} samples",
                estimator.name(),
                class_i,
                class_j,
                pair_train_indices.len()
            );
            Ok((estimator, pair_train_indices))
        })?;
        debug!("fitted {} one-vs-one pairs", n_pairs);

        let (estimators, indices): (Vec<_>, Vec<_>) = fitted.into_iter().unzip();
        self.pairwise_indices = if pairwise {
            Some(indices)
        } else {
            None
        };
        self.estimators = estimators;
        self.classes = classes;
        Ok(())
    }

    fn predict(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<usize>> {
        self.check_is_fitted()?;
        if self.n_classes() == 2 {
            let (sample_indices, view_indices) =
                resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;
            let (scores, threshold) = self.pair_scores(0, X, &sample_indices, &view_indices)?;
            return Ok(scores.mapv(|score| self.classes[(score > threshold) as usize]));
        }
        let decision = self.decision_matrix(X, sample_indices, view_indices)?;
        Ok(decision
            .rows()
            .into_iter()
            .map(|row| self.classes[first_argmax(row)])
            .collect())
    }

    /// The score of the single pair estimator of a binary problem, shifted so
    /// that positive values favour the larger class.
    fn decision_function(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<F>> {
        self.check_is_fitted()?;
        if self.n_classes() != 2 {
            return Err(MultiviewError::Configuration(format!(
                "a one-vs-one margin is only defined for two classes, got {}, use `decision_matrix`",
                self.n_classes()
            )));
        }
        let (sample_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;
        let (scores, threshold) = self.pair_scores(0, X, &sample_indices, &view_indices)?;
        Ok(scores.mapv(|score| score - threshold))
    }
}
