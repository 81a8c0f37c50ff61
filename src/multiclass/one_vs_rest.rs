use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::binary::{fit_binary, predict_binary};
use super::hyperparams::{DecompositionParams, DecompositionValidParams};
use super::label_binarizer::{LabelBinarizer, TargetType};
use super::{fan_out, resolve_decomposition_indices};
use crate::datasets::MultiviewDataset;
use crate::error::{MultiviewError, Result};
use crate::estimators::{check_labels, Capabilities, MultiviewEstimator};
use crate::param_guard::ParamGuard;
use crate::Float;

/// One-vs-Rest decomposition
///
/// One binary estimator is trained per class, separating that class from all
/// the others. A sample is assigned the class whose estimator scores it the
/// highest; on ties, the estimator of the larger class wins.
///
/// Binary targets are handled with a single estimator whose positive class is
/// the larger of the two, and a target with a single class always predicts it.
#[derive(Debug, Clone)]
pub struct OneVsRest<E> {
    estimator: E,
    params: DecompositionValidParams,
    label_binarizer: Option<LabelBinarizer>,
    estimators: Vec<E>,
}

impl<E> OneVsRest<E> {
    /// Creates an unfitted decomposition with default parameters
    pub fn new(estimator: E) -> Self {
        OneVsRest {
            estimator,
            params: DecompositionValidParams::default(),
            label_binarizer: None,
            estimators: Vec::new(),
        }
    }

    /// Creates an unfitted decomposition, checking the parameters first
    pub fn with_params(estimator: E, params: DecompositionParams) -> Result<Self> {
        Ok(OneVsRest {
            params: params.check()?,
            ..Self::new(estimator)
        })
    }

    pub(crate) fn from_valid_params(estimator: E, params: DecompositionValidParams) -> Self {
        OneVsRest {
            params,
            ..Self::new(estimator)
        }
    }

    pub fn params() -> DecompositionParams {
        DecompositionParams::new()
    }

    /// The wrapped, never fitted, estimator.
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Fitted sub-estimators, one per indicator column.
    pub fn estimators(&self) -> &[E] {
        &self.estimators
    }

    /// Sorted class values seen during fit.
    pub fn classes(&self) -> &[usize] {
        self.label_binarizer
            .as_ref()
            .map_or(&[][..], |binarizer| binarizer.classes())
    }

    pub fn label_binarizer(&self) -> Option<&LabelBinarizer> {
        self.label_binarizer.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.label_binarizer.is_some()
    }

    fn fitted_binarizer(&self) -> Result<&LabelBinarizer> {
        self.label_binarizer
            .as_ref()
            .ok_or(MultiviewError::NotFitted("OneVsRest"))
    }
}

impl<E> OneVsRest<E> {
    fn fit_columns<F>(
        &self,
        X: &MultiviewDataset<F>,
        binarizer: &LabelBinarizer,
        train_indices: &[usize],
        view_indices: &[usize],
    ) -> Result<Vec<E>>
    where
        F: Float,
        E: MultiviewEstimator<F>,
    {
        let columns = (0..binarizer.n_columns()).collect::<Vec<_>>();
        fan_out(self.params.n_jobs(), columns, |column| {
            let y_column = binarizer.column(column);
            let estimator = fit_binary(
                &self.estimator,
                X,
                y_column.view(),
                train_indices,
                view_indices,
            )?;
            debug!(
                "fitted one-vs-rest {} for column {} of {}",
                estimator.name(),
                column,
                binarizer.n_columns()
            );
            Ok(estimator)
        })
    }

    /// This method fits one estimator per column of an indicator matrix; column
    /// `k` flags the samples carrying label `k`. Predictions are then read with
    /// [`OneVsRest::predict_label_sets`].
    pub fn fit_multilabel<F>(
        &mut self,
        X: &MultiviewDataset<F>,
        Y: ArrayView2<bool>,
        train_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<()>
    where
        F: Float,
        E: MultiviewEstimator<F>,
    {
        self.label_binarizer = None;
        self.estimators.clear();
        if Y.nrows() != X.get_nb_samples() {
            return Err(MultiviewError::ShapeMismatch {
                what: "indicator rows",
                expected: X.get_nb_samples(),
                found: Y.nrows(),
            });
        }
        let (train_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, train_indices, view_indices)?;
        let binarizer = LabelBinarizer::fit_indicator(Y);
        self.estimators = self.fit_columns(X, &binarizer, &train_indices, &view_indices)?;
        self.label_binarizer = Some(binarizer);
        Ok(())
    }

    /// This method thresholds the score of every sub-estimator (`0` for
    /// margins, `0.5` for probabilities) and maps the resulting indicator matrix
    /// back to one label set per sample.
    pub fn predict_label_sets<F>(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Vec<Vec<usize>>>
    where
        F: Float,
        E: MultiviewEstimator<F>,
    {
        let binarizer = self.fitted_binarizer()?;
        let (sample_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;

        let mut indicator = Array2::from_elem((sample_indices.len(), self.estimators.len()), false);
        for (k, estimator) in self.estimators.iter().enumerate() {
            let (scores, threshold) =
                predict_binary(estimator, X, &sample_indices, &view_indices)?;
            check_scores(scores.view(), sample_indices.len())?;
            for (flag, &score) in indicator.column_mut(k).iter_mut().zip(scores.iter()) {
                *flag = score > threshold;
            }
        }
        binarizer.inverse_transform(indicator.view())
    }

    /// Positive-class score of every sub-estimator, one column per estimator.
    fn score_matrix<F>(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: &[usize],
        view_indices: &[usize],
    ) -> Result<Vec<Array1<F>>>
    where
        F: Float,
        E: MultiviewEstimator<F>,
    {
        self.estimators
            .iter()
            .map(|estimator| {
                let (scores, _) = predict_binary(estimator, X, sample_indices, view_indices)?;
                check_scores(scores.view(), sample_indices.len())?;
                Ok(scores)
            })
            .collect()
    }
}

fn check_scores<F>(scores: ArrayView1<F>, n_samples: usize) -> Result<()> {
    if scores.len() != n_samples {
        return Err(MultiviewError::ShapeMismatch {
            what: "binary scores",
            expected: n_samples,
            found: scores.len(),
        });
    }
    Ok(())
}

impl<F: Float, E: MultiviewEstimator<F>> MultiviewEstimator<F> for OneVsRest<E> {
    fn name(&self) -> String {
        format!("ovr_{}", self.estimator.name())
    }

    fn capabilities(&self) -> Capabilities {
        let inner = self.estimator.capabilities();
        Capabilities {
            margin: inner.margin,
            probability: inner.probability,
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
        self.label_binarizer = None;
        self.estimators.clear();
        check_labels(X, y)?;
        let (train_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, train_indices, view_indices)?;
        let binarizer = LabelBinarizer::fit(y);
        self.estimators = self.fit_columns(X, &binarizer, &train_indices, &view_indices)?;
        self.label_binarizer = Some(binarizer);
        Ok(())
    }

    fn predict(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<usize>> {
        let binarizer = self.fitted_binarizer()?;
        match binarizer.target_type() {
            TargetType::Multiclass => {
                let (sample_indices, view_indices) =
                    resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;
                let n_samples = sample_indices.len();
                let mut maxima = Array1::from_elem(n_samples, F::neg_infinity());
                let mut argmaxima = Array1::<usize>::zeros(n_samples);
                for (k, estimator) in self.estimators.iter().enumerate() {
                    let (scores, _) =
                        predict_binary(estimator, X, &sample_indices, &view_indices)?;
                    check_scores(scores.view(), n_samples)?;
                    // The last estimator reaching the running maximum holds it.
                    for ((maximum, argmaximum), &score) in maxima
                        .iter_mut()
                        .zip(argmaxima.iter_mut())
                        .zip(scores.iter())
                    {
                        *maximum = if maximum.is_nan() || score.is_nan() {
                            F::nan()
                        } else {
                            (*maximum).max(score)
                        };
                        if *maximum == score {
                            *argmaximum = k;
                        }
                    }
                }
                Ok(argmaxima.mapv(|k| binarizer.classes()[k]))
            }
            TargetType::Binary => Ok(self
                .predict_label_sets(X, sample_indices, view_indices)?
                .into_iter()
                .map(|label_set| label_set[0])
                .collect()),
            TargetType::Multilabel => Err(MultiviewError::Configuration(
                "a multilabel one-vs-rest predicts label sets, use `predict_label_sets`"
                    .to_string(),
            )),
        }
    }

    /// The score of the single sub-estimator of a binary problem, shifted so
    /// that positive values favour the larger class.
    fn decision_function(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<F>> {
        let binarizer = self.fitted_binarizer()?;
        if binarizer.target_type() != TargetType::Binary || self.estimators.len() != 1 {
            return Err(MultiviewError::Configuration(format!(
                "a one-vs-rest margin is only defined for two classes, got {}",
                binarizer.classes().len()
            )));
        }
        let (sample_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;
        let (scores, threshold) =
            predict_binary(&self.estimators[0], X, &sample_indices, &view_indices)?;
        Ok(scores.mapv(|score| score - threshold))
    }

    /// Positive-class probability of every sub-estimator, normalised to sum to
    /// one over the classes of a multiclass problem.
    fn predict_proba(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array2<F>> {
        let binarizer = self.fitted_binarizer()?;
        if !self.estimator.capabilities().probability {
            return Err(MultiviewError::Capability {
                estimator: self.estimator.name(),
                method: "predict_proba",
            });
        }
        let (sample_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;
        let n_samples = sample_indices.len();
        let columns = self
            .estimators
            .iter()
            .map(|estimator| {
                let proba = estimator.predict_proba(X, Some(&sample_indices), Some(&view_indices))?;
                if proba.ncols() < 2 || proba.nrows() != n_samples {
                    return Err(MultiviewError::ShapeMismatch {
                        what: "probability columns",
                        expected: 2,
                        found: proba.ncols(),
                    });
                }
                Ok(proba.column(1).to_owned())
            })
            .collect::<Result<Vec<_>>>()?;

        match binarizer.target_type() {
            TargetType::Binary if columns.len() == 1 => {
                let positive = &columns[0];
                Ok(Array2::from_shape_fn((n_samples, 2), |(i, k)| {
                    if k == 1 {
                        positive[i]
                    } else {
                        F::one() - positive[i]
                    }
                }))
            }
            TargetType::Binary => Ok(Array2::ones((n_samples, 1))),
            TargetType::Multiclass | TargetType::Multilabel => {
                let mut proba = Array2::from_shape_fn((n_samples, columns.len()), |(i, k)| {
                    columns[k][i]
                });
                if binarizer.target_type() == TargetType::Multiclass {
                    for mut row in proba.rows_mut() {
                        let total = row.sum();
                        if total > F::zero() {
                            row /= total;
                        }
                    }
                }
                Ok(proba)
            }
        }
    }
}

impl<E> OneVsRest<E> {
    /// Raw score of every sub-estimator for the selected samples, one row per
    /// sample and one column per estimator.
    pub fn score_samples<F>(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array2<F>>
    where
        F: Float,
        E: MultiviewEstimator<F>,
    {
        self.fitted_binarizer()?;
        let (sample_indices, view_indices) =
            resolve_decomposition_indices(&self.params, X, sample_indices, view_indices)?;
        let columns = self.score_matrix(X, &sample_indices, &view_indices)?;
        Ok(Array2::from_shape_fn(
            (sample_indices.len(), columns.len()),
            |(i, k)| columns[k][i],
        ))
    }
}
