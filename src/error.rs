use std::fmt;

use thiserror::Error;

/// Simplified `Result` using [`MultiviewError`](crate::MultiviewError) as error type
pub type Result<T> = std::result::Result<T, MultiviewError>;

/// The kind of index that was found out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Sample,
    View,
    Feature,
    Label,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            IndexKind::Sample => "sample",
            IndexKind::View => "view",
            IndexKind::Feature => "feature",
            IndexKind::Label => "label",
        };
        write!(f, "{}", kind)
    }
}

/// Error variants from dataset access, hyperparameter validation and model
/// estimation
#[derive(Debug, Error)]
pub enum MultiviewError {
    /// A decomposition was asked to fit a problem it cannot express, e.g. a
    /// one-vs-one fit with a single class.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The estimator exposes no usable scoring method.
    #[error("estimator {estimator} does not support {method}")]
    Capability {
        estimator: String,
        method: &'static str,
    },
    #[error("{kind} index {index} is out of range for {len} entries")]
    IndexOutOfRange {
        kind: IndexKind,
        index: usize,
        len: usize,
    },
    /// `predict` was invoked before `fit`.
    #[error("this {0} instance is not fitted yet, call `fit` first")]
    NotFitted(&'static str),
    #[error("unknown view name {0:?}")]
    UnknownView(String),
    #[error("unknown label name {0:?}")]
    UnknownLabel(String),
    #[error("{what}: expected {expected}, got {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("invalid number of jobs {0}")]
    InvalidJobs(usize),
    #[error("invalid noise standard deviation {0}")]
    InvalidNoiseStd(f32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MultiviewError {
    pub(crate) fn out_of_range(kind: IndexKind, index: usize, len: usize) -> Self {
        MultiviewError::IndexOutOfRange { kind, index, len }
    }
}
