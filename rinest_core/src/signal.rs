//! Signal builder: raw sample pair to regression vector.

use crate::types::RegressorVector;

/// Build the regressor for one step.
///
/// `dt` must be strictly positive; the estimator skips the whole step otherwise.
#[inline]
pub fn build_regressor(
    current: f64,
    current_prev: f64,
    dt: f64,
    voltage_predicted_prev: f64,
) -> RegressorVector {
    debug_assert!(dt > 0.0, "build_regressor called with dt={dt}");
    RegressorVector([
        -(current - current_prev) / dt,
        -current,
        -voltage_predicted_prev,
        1.0,
    ])
}
