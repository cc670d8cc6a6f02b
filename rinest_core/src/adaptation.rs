//! Gradient (MIT rule) adaptation of the parameter vector.
//!
//! `p[i] += mu[i] * e * s[i] * dt`
//!
//! There is no covariance matrix, forgetting factor or regressor normalization:
//! stability and convergence rate depend only on the fixed gains. Large,
//! persistent currents slow or bias convergence. Divergence is not detected
//! here and only shows up in the diagnostic stream.

use crate::types::{ParameterVector, RegressorVector};

#[inline]
pub fn adapt(
    params: &mut ParameterVector,
    gains: &[f64; 4],
    error: f64,
    regressor: &RegressorVector,
    dt: f64,
) {
    for ((p, mu), s) in params.0.iter_mut().zip(gains).zip(regressor.0.iter()) {
        *p += mu * error * s * dt;
    }
}
