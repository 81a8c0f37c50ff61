//! The interface every wrapped multiview estimator implements.

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::datasets::{MultiviewDataset, View};
use crate::error::{MultiviewError, Result};
use crate::Float;


/// Capability descriptor attached to every estimator implementation.
///
/// The decompositions query it directly instead of probing for methods:
/// - `margin`: [`MultiviewEstimator::decision_function`] is implemented;
/// - `probability`: [`MultiviewEstimator::predict_proba`] is implemented;
/// - `multiclass`: the estimator natively handles more than two classes;
/// - `pairwise`: feature matrices must be restricted to the training samples
///   of a model when scoring it (precomputed kernels);
/// - `regressor`: [`MultiviewEstimator::predict_values`] is the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub margin: bool,
    pub probability: bool,
    pub multiclass: bool,
    pub pairwise: bool,
    pub regressor: bool,
}

/// Number of samples, features and classes of the fake problem fitted by the
/// default [`MultiviewEstimator::accepts_multiclass`] probe.
pub const PROBE_SAMPLES: usize = 10;
pub const PROBE_FEATURES: usize = 2;
pub const PROBE_CLASSES: usize = 3;

/// Multiview estimator
///
/// An estimator is trained and scored against a [`MultiviewDataset`] through
/// explicit sample and view index subsets; `None` stands for all samples or
/// all views. Label vectors are aligned with the dataset rows: `y[i]` is the
/// label of sample `i`, whether or not `i` is part of the training subset.
pub trait MultiviewEstimator<F: Float>: Clone + Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> String;

    fn capabilities(&self) -> Capabilities;

    fn fit(
        &mut self,
        X: &MultiviewDataset<F>,
        y: ArrayView1<usize>,
        train_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<()>;

    /// Predicted class of every selected sample.
    fn predict(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<usize>>;

    /// Real-valued predictions. Regressors override it; classifiers return
    /// their predicted class.
    fn predict_values(
        &self,
        X: &MultiviewDataset<F>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<F>> {
        Ok(self
            .predict(X, sample_indices, view_indices)?
            .mapv(|class| F::cast(class)))
    }

    /// Margin score of every selected sample; positive values favour the
    /// positive class.
    fn decision_function(
        &self,
        _X: &MultiviewDataset<F>,
        _sample_indices: Option<&[usize]>,
        _view_indices: Option<&[usize]>,
    ) -> Result<Array1<F>> {
        Err(MultiviewError::Capability {
            estimator: self.name(),
            method: "decision_function",
        })
    }

    /// Class probabilities, one column per class in sorted class order.
    fn predict_proba(
        &self,
        _X: &MultiviewDataset<F>,
        _sample_indices: Option<&[usize]>,
        _view_indices: Option<&[usize]>,
    ) -> Result<Array2<F>> {
        Err(MultiviewError::Capability {
            estimator: self.name(),
            method: "predict_proba",
        })
    }

    /// Capability probe for native multiclass support.
    ///
    /// The default implementation requires the `multiclass` flag and then fits
    /// the estimator on a fake three-class problem drawn from `seed`. It
    /// mutates the estimator, so callers probe a disposable clone.
    fn accepts_multiclass(&mut self, seed: u64) -> bool {
        if !self.capabilities().multiclass {
            return false;
        }
        match fake_multiclass_problem::<F>(seed, PROBE_SAMPLES, PROBE_FEATURES, PROBE_CLASSES) {
            Ok((X, y)) => self.fit(&X, y.view(), None, None).is_ok(),
            Err(_) => false,
        }
    }

    /// Mean accuracy on the selected samples.
    fn score(
        &self,
        X: &MultiviewDataset<F>,
        y: ArrayView1<usize>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<F> {
        let (sample_indices, view_indices) = X.resolve_indices(sample_indices, view_indices)?;
        check_labels(X, y)?;
        if sample_indices.is_empty() {
            return Ok(F::zero());
        }
        let predictions = self.predict(X, Some(&sample_indices), Some(&view_indices))?;
        let correct = sample_indices
            .iter()
            .zip(predictions.iter())
            .filter(|&(&i, &predicted)| y[i] == predicted)
            .count();
        Ok(F::cast(correct) / F::cast(sample_indices.len()))
    }
}

/// This function checks that a label vector is aligned with the dataset rows.
pub fn check_labels<F: Float>(X: &MultiviewDataset<F>, y: ArrayView1<usize>) -> Result<()> {
    if y.len() != X.get_nb_samples() {
        return Err(MultiviewError::ShapeMismatch {
            what: "labels",
            expected: X.get_nb_samples(),
            found: y.len(),
        });
    }
    Ok(())
}

/// This function builds a single-view dataset of integer features in
/// `[0, 100]` with labels cycling through `0..n_classes`; the remainder samples
/// get label `0`.
pub fn fake_multiclass_problem<F: Float>(
    seed: u64,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
) -> Result<(MultiviewDataset<F>, Array1<usize>)> {
    if n_classes == 0 || n_samples / n_classes < 1 {
        return Err(MultiviewError::Configuration(format!(
            "cannot build a {}-class problem out of {} samples",
            n_classes, n_samples
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let X = Array2::from_shape_simple_fn((n_samples, n_features), || {
        F::cast(rng.gen_range(0..101_u32))
    });
    let y = (0..n_samples / n_classes)
        .flat_map(|_| 0..n_classes)
        .chain(std::iter::repeat(0).take(n_samples % n_classes))
        .collect::<Array1<usize>>();

    let label_names = (0..n_classes).map(|class| class.to_string()).collect();
    let dataset = MultiviewDataset::new(vec![View::dense("fake", X)?], y.clone(), label_names)?;
    Ok((dataset, y))
}
