#![allow(non_snake_case)]

//! Multiclass decomposition for multiview estimators.
//!
//! The crate is organised around two tightly coupled parts:
//!
//! - [`datasets`]: an index-addressable multiview store ([`datasets::MultiviewDataset`])
//!   supplying feature matrices, labels and metadata, with filtering, noise
//!   injection and label remapping.
//! - [`multiclass`]: One-vs-Rest and One-vs-One adapters that train binary
//!   multiview estimators against explicit sample/view index subsets, and the
//!   dispatcher choosing between them.

use ndarray::ScalarOperand;

use num_traits::{NumAssignOps, NumCast};

use std::fmt;
use std::iter::Sum;

/// Float point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point
/// number and implement them for 32bit and 64bit float points.
/// Ref: https://github.com/rust-ml/linfa/blob/master/src/dataset/mod.rs#L36
pub trait Float:
    num_traits::Float
    + NumAssignOps
    + Sum
    + ScalarOperand
    + approx::AbsDiffEq
    + fmt::Display
    + fmt::Debug
    + Default
    + Send
    + Sync
    + 'static
{
    /// Casts a primitive into `Self`. Every primitive used in this crate is
    /// representable as a float, so the conversion saturates to NaN rather
    /// than failing.
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap_or_else(Self::nan)
    }
}

impl Float for f32 {}

impl Float for f64 {}

pub mod datasets;
pub mod error;
pub mod estimators;
pub mod helpers;
pub mod multiclass;
pub mod param_guard;

pub use error::{MultiviewError, Result};
