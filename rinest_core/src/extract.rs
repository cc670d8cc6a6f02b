//! Physical quantities from the abstract parameter vector.
//!
//! Division by a near-zero `p2` or a near-zero current is not guarded here;
//! callers decide whether to use the result. The commit clamp is the last
//! line of defence for persisted values.

use crate::types::{ParameterVector, PhysicalParams};

#[inline]
pub fn physical_params(params: &ParameterVector) -> PhysicalParams {
    let [p0, p1, p2, p3] = params.0;
    PhysicalParams {
        r_steady_state: p0,
        r_transient: p1 / p2 - p0,
        voltage_open_circuit: p3 / p2,
    }
}

/// Instantaneous internal resistance from the simplified Rint relation.
#[inline]
pub fn internal_resistance(voltage: f64, voltage_open_circuit: f64, current: f64) -> f64 {
    (voltage - voltage_open_circuit) / (-current)
}
