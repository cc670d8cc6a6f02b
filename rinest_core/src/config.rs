//! Runtime configuration structs used by `EstimatorCore`.
//!
//! They are separate from the TOML-deserialized config in `rinest_config`;
//! see `conversions` for the mapping.

use crate::types::ParameterVector;

/// Nominal first-order Thevenin circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCfg {
    /// Series resistance `r_s` (ohm).
    pub r_series_ohm: f64,
    /// RC-branch resistance `r_t` (ohm).
    pub r_transient_ohm: f64,
    /// RC-branch capacitance `c_t` (farad).
    pub c_transient_f: f64,
    /// Open-circuit voltage guess; also the initial predicted voltage.
    pub v_open_circuit_v: f64,
}

impl Default for ModelCfg {
    fn default() -> Self {
        Self {
            r_series_ohm: 0.1,
            r_transient_ohm: 0.05,
            c_transient_f: 500.0,
            v_open_circuit_v: 22.1,
        }
    }
}

impl ModelCfg {
    pub fn nominal_parameters(&self) -> ParameterVector {
        ParameterVector::from_circuit(
            self.r_series_ohm,
            self.r_transient_ohm,
            self.c_transient_f,
            self.v_open_circuit_v,
        )
    }
}

/// Adaptation law tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationCfg {
    /// Per-component gains `mu`.
    pub gains: [f64; 4],
    /// Leakage gain `lambda` of the predictor correction.
    pub leakage: f64,
    /// Samples with |current| below this are not offered to the tracker.
    pub min_abs_current_a: f64,
}

impl Default for AdaptationCfg {
    fn default() -> Self {
        Self {
            gains: [1e-4; 4],
            leakage: 0.8,
            min_abs_current_a: 1e-3,
        }
    }
}

/// Commit policy tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitCfg {
    pub period_s: f64,
    pub resolution_ohm: f64,
    pub clamp_min_ohm: f64,
    pub clamp_max_ohm: f64,
    pub param_key: String,
}

impl Default for CommitCfg {
    fn default() -> Self {
        Self {
            period_s: 10.0,
            resolution_ohm: 0.01,
            clamp_min_ohm: 0.01,
            clamp_max_ohm: 0.2,
            param_key: "BAT1_R_INTERNAL".to_string(),
        }
    }
}
