use crate::error::{MultiviewError, Result};
use crate::param_guard::ParamGuard;

/// Whether a decomposition wraps a monoview estimator (exactly one view is
/// handed to every sub-estimator) or a multiview one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Monoview,
    Multiview,
}

/// A verified hyperparameter set ready for the fitting of a multiclass
/// decomposition
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionValidParams {
    n_jobs: usize,
    view_mode: ViewMode,
}

impl Default for DecompositionValidParams {
    fn default() -> Self {
        DecompositionValidParams {
            n_jobs: 1,
            view_mode: ViewMode::Multiview,
        }
    }
}

impl DecompositionValidParams {
    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub(crate) fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }
}

/// A hyper-parameter set during construction
///
/// Sub-estimators of a decomposition are independent, so their fits may run on
/// a worker pool of `n_jobs` threads. A single job runs them one after the
/// other, which is usually faster for cheap estimators.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionParams(DecompositionValidParams);

impl Default for DecompositionParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure a One-vs-Rest or One-vs-One decomposition
impl DecompositionParams {
    /// Create default decomposition hyper parameters
    pub fn new() -> DecompositionParams {
        Self(DecompositionValidParams::default())
    }

    /// Set the number of threads used to fit the sub-estimators.
    ///
    /// Defaults to `1` (sequential) if not set.
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.0.n_jobs = n_jobs;
        self
    }

    /// Set the view mode of the wrapped estimator.
    ///
    /// Defaults to `ViewMode::Multiview` if not set.
    pub fn view_mode(mut self, view_mode: ViewMode) -> Self {
        self.0.view_mode = view_mode;
        self
    }
}

impl ParamGuard for DecompositionParams {
    type Checked = DecompositionValidParams;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_jobs == 0 {
            Err(MultiviewError::InvalidJobs(self.0.n_jobs))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
