use crate::error::Result;

/// Hyperparameters whose values have not been validated yet.
///
/// Builders such as [`DecompositionParams`](crate::multiclass::DecompositionParams) and
/// [`NoiseParams`](crate::datasets::NoiseParams) accept any value; the validated set is only
/// reachable through `check_ref` or `check`, which decompositions and dataset operations call
/// before using it. Both methods must apply the same validation.
pub trait ParamGuard {
    /// The validated hyperparameters
    type Checked;

    fn check_ref(&self) -> Result<&Self::Checked>;

    fn check(self) -> Result<Self::Checked>;

    /// Calls `check()` and panics on invalid hyperparameters
    fn check_unwrap(self) -> Self::Checked
    where
        Self: Sized,
    {
        match self.check() {
            Ok(checked) => checked,
            Err(err) => panic!("invalid hyperparameters: {}", err),
        }
    }
}
