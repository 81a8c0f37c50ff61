use std::path::Path;

use log::info;
use ndarray::{Array2, ArrayView2};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use sprs::CsMat;

use super::{store, MultiviewDataset, ViewMatrix};
use crate::error::{MultiviewError, Result};
use crate::param_guard::ParamGuard;
use crate::Float;

/// A verified hyperparameter set ready for noise injection
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseValidParams<F> {
    noise_std: F,
}

impl<F: Float> NoiseValidParams<F> {
    pub fn noise_std(&self) -> F {
        self.noise_std
    }
}

/// A hyper-parameter set during construction
///
/// The noise added to feature `j` of a view is drawn from
/// ```ignore
/// N(0, noise_std) * (max_j - min_j)
/// ```
/// and the noisy value is clipped to `[min_j, max_j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseParams<F>(NoiseValidParams<F>);

impl<F: Float> Default for NoiseParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> NoiseParams<F> {
    pub fn new() -> NoiseParams<F> {
        Self(NoiseValidParams {
            noise_std: F::cast(0.15),
        })
    }

    /// Set the standard deviation of the noise, relative to each feature range.
    ///
    /// Defaults to `0.15` if not set.
    pub fn noise_std(mut self, noise_std: F) -> Self {
        self.0.noise_std = noise_std;
        self
    }
}

impl<F: Float> ParamGuard for NoiseParams<F> {
    type Checked = NoiseValidParams<F>;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let noise_std = self.0.noise_std;
        if !noise_std.is_finite() || noise_std < F::zero() {
            Err(MultiviewError::InvalidNoiseStd(
                noise_std.to_f32().unwrap_or(f32::NAN),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float> MultiviewDataset<F> {
    /// This method returns a noisy copy of the dataset. The source dataset is
    /// left untouched; every view keeps its shape, sparsity and limits.
    ///
    /// Noise is drawn view by view, in row-major order, from `rng`. Sparse views
    /// only perturb their stored entries. When `destination` is set, the noisy
    /// dataset is also written there as `<name>_noised`.
    pub fn add_gaussian_noise<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        destination: Option<&Path>,
        params: &NoiseParams<F>,
    ) -> Result<Self>
    where
        F: Serialize,
    {
        let params = params.check_ref()?;
        let noise_std = params.noise_std().to_f64().unwrap_or(f64::NAN);
        let normal = Normal::new(0., noise_std)
            .map_err(|_| MultiviewError::InvalidNoiseStd(noise_std as f32))?;

        let mut noisy = self.clone();
        for view in noisy.views.iter_mut() {
            let limits = view.limits.view();
            view.data = match &view.data {
                ViewMatrix::Dense(data) => {
                    ViewMatrix::Dense(noise_dense(data, limits, &normal, rng))
                }
                ViewMatrix::Sparse(data) => {
                    ViewMatrix::Sparse(noise_sparse(data, limits, &normal, rng))
                }
            };
        }

        info!(
            "added gaussian noise (std {}) to the {} views of dataset {}",
            params.noise_std(),
            noisy.get_nb_view(),
            self.artifact_stem()
        );
        if let Some(destination) = destination {
            store::save(&noisy, destination, &format!("{}_noised", self.artifact_stem()))?;
        }
        Ok(noisy)
    }
}

fn perturb<F: Float, R: Rng + ?Sized>(
    value: F,
    j: usize,
    limits: ArrayView2<F>,
    normal: &Normal<f64>,
    rng: &mut R,
) -> F {
    let (min, max) = (limits[[j, 0]], limits[[j, 1]]);
    let noise = F::cast(normal.sample(rng)) * (max - min);
    (value + noise).max(min).min(max)
}

fn noise_dense<F: Float, R: Rng + ?Sized>(
    data: &Array2<F>,
    limits: ArrayView2<F>,
    normal: &Normal<f64>,
    rng: &mut R,
) -> Array2<F> {
    let mut noisy = data.clone();
    for ((_, j), value) in noisy.indexed_iter_mut() {
        *value = perturb(*value, j, limits, normal, rng);
    }
    noisy
}

fn noise_sparse<F: Float, R: Rng + ?Sized>(
    data: &CsMat<F>,
    limits: ArrayView2<F>,
    normal: &Normal<f64>,
    rng: &mut R,
) -> CsMat<F> {
    let shape = (data.rows(), data.cols());
    let (indptr, indices, mut values) = data.clone().into_raw_storage();
    for (value, &j) in values.iter_mut().zip(indices.iter()) {
        *value = perturb(*value, j, limits, normal, rng);
    }
    CsMat::new(shape, indptr, indices, values)
}
