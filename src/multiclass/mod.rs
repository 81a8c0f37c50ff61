//! Multiclass decompositions of binary multiview estimators.
//!
//! [`OneVsRest`] trains one estimator per class, [`OneVsOne`] one estimator per
//! pair of classes. Both train independent clones of the wrapped estimator
//! against explicit sample and view index subsets, and [`get_mc_estim`] picks
//! the right one, if any, for a given estimator and label vector.

use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

use crate::datasets::MultiviewDataset;
use crate::error::{MultiviewError, Result};
use crate::estimators::{Capabilities, MultiviewEstimator};
use crate::helpers::helpers::unique_sorted;
use crate::Float;

#[cfg(test)]
mod tests;

pub mod binary;
mod hyperparams;
pub mod label_binarizer;
mod one_vs_one;
mod one_vs_rest;

pub use hyperparams::{DecompositionParams, DecompositionValidParams, ViewMode};
pub use label_binarizer::{LabelBinarizer, TargetType};
pub use one_vs_one::{pairwise_decision_function, OneVsOne};
pub use one_vs_rest::OneVsRest;

/// An estimator as returned by [`get_mc_estim`]: either untouched, or wrapped
/// in a multiclass decomposition.
#[derive(Debug, Clone)]
pub enum MulticlassEstimator<E> {
    Native(E),
    OneVsRest(OneVsRest<E>),
    OneVsOne(OneVsOne<E>),
}

impl<E> MulticlassEstimator<E> {
    pub fn is_wrapped(&self) -> bool {
        !matches!(self, MulticlassEstimator::Native(_))
    }

    /// The estimator itself, or the one wrapped by the decomposition.
    pub fn inner(&self) -> &E {
        match self {
            MulticlassEstimator::Native(estimator) => estimator,
            MulticlassEstimator::OneVsRest(ovr) => ovr.estimator(),
            MulticlassEstimator::OneVsOne(ovo) => ovo.estimator(),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $estimator:ident => $call:expr) => {
        match $self {
            MulticlassEstimator::Native($estimator) => $call,
            MulticlassEstimator::OneVsRest($estimator) => $call,
            MulticlassEstimator::OneVsOne($estimator) => $call,
        }
    };
}

impl<F: Float, E: MultiviewEstimator<F>> MultiviewEstimator<F> for MulticlassEstimator<E> {
    fn name(&self) -> String {
        delegate!(self, estimator => MultiviewEstimator::<F>::name(estimator))
    }

    fn capabilities(&self) -> Capabilities {
        delegate!(self, estimator => MultiviewEstimator::<F>::capabilities(estimator))
    }

    fn fit(
        &mut self,
        X: &MultiviewDataset<F>,
        y: ArrayView1<usize>,
        train_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<()> {
        delegate!(self, estimator => estimator.fit(X, y, train_indices, view_indices))
    }

    fn predict(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<usize>> {
        delegate!(self, estimator => estimator.predict(X, sample_indices, view_indices))
    }

    fn predict_values(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<F>> {
        delegate!(self, estimator => estimator.predict_values(X, sample_indices, view_indices))
    }

    fn decision_function(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<F>> {
        delegate!(self, estimator => estimator.decision_function(X, sample_indices, view_indices))
    }

    fn predict_proba(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array2<F>> {
        delegate!(self, estimator => estimator.predict_proba(X, sample_indices, view_indices))
    }

    fn accepts_multiclass(&mut self, seed: u64) -> bool {
        delegate!(self, estimator => MultiviewEstimator::<F>::accepts_multiclass(estimator, seed))
    }
}

/// This function returns an estimator able to handle the given labels.
///
/// The estimator is wrapped when the labels hold more than two distinct values
/// or `multiclass` is set, and a probe clone of the estimator, seeded with
/// `seed`, does not accept multiclass problems. One-vs-Rest is chosen for
/// estimators with probabilities, One-vs-One otherwise. `multiview` selects
/// the multiview flavour of the wrapper; the monoview one hands a single view
/// to every sub-estimator.
pub fn get_mc_estim<F, E>(
    estimator: E,
    seed: u64,
    y: Option<ArrayView1<usize>>,
    multiview: bool,
    multiclass: bool,
) -> MulticlassEstimator<E>
where
    F: Float,
    E: MultiviewEstimator<F>,
{
    let needs_multiclass =
        multiclass || y.map_or(false, |y| unique_sorted(y.iter().copied()).len() > 2);
    if !needs_multiclass || estimator.clone().accepts_multiclass(seed) {
        return MulticlassEstimator::Native(estimator);
    }

    let view_mode = if multiview {
        ViewMode::Multiview
    } else {
        ViewMode::Monoview
    };
    let params = DecompositionValidParams::default().with_view_mode(view_mode);
    if estimator.capabilities().probability {
        debug!("wrapping {} in a one-vs-rest decomposition", estimator.name());
        MulticlassEstimator::OneVsRest(OneVsRest::from_valid_params(estimator, params))
    } else {
        debug!("wrapping {} in a one-vs-one decomposition", estimator.name());
        MulticlassEstimator::OneVsOne(OneVsOne::from_valid_params(estimator, params))
    }
}

/// This function resolves the sample and view indices handed to a
/// decomposition. A monoview decomposition requires exactly one view.
pub(crate) fn resolve_decomposition_indices<F: Float>(
    params: &DecompositionValidParams,
    X: &MultiviewDataset<F>,
    sample_indices: Option<&[usize]>,
    view_indices: Option<&[usize]>,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let (sample_indices, view_indices) = X.resolve_indices(sample_indices, view_indices)?;
    if params.view_mode() == ViewMode::Monoview && view_indices.len() != 1 {
        return Err(MultiviewError::ShapeMismatch {
            what: "monoview views",
            expected: 1,
            found: view_indices.len(),
        });
    }
    Ok((sample_indices, view_indices))
}

/// This function runs `job` on every task and returns the outputs in task
/// order. A single job runs the tasks sequentially on the calling thread,
/// more jobs run them on a dedicated pool of `n_jobs` threads.
pub(crate) fn fan_out<T, R, J>(n_jobs: usize, tasks: Vec<T>, job: J) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    J: Fn(T) -> Result<R> + Send + Sync,
{
    if n_jobs <= 1 || tasks.len() <= 1 {
        return tasks.into_iter().map(job).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(n_jobs).build()?;
    pool.install(|| tasks.into_par_iter().map(job).collect())
}
