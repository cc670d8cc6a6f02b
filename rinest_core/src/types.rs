//! Value types flowing through the per-sample pipeline.

/// Regression vector `[s0, s1, s2, s3]`:
/// negated current derivative, negated current, negated previous prediction, bias.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegressorVector(pub [f64; 4]);

impl RegressorVector {
    #[inline]
    pub fn as_array(&self) -> &[f64; 4] {
        &self.0
    }
}

/// Adaptive coefficients of the continuous-time Thevenin model
///
/// `dV/dt = -p0 * dI/dt - p1 * I - p2 * V + p3`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterVector(pub [f64; 4]);

impl ParameterVector {
    /// Map nominal circuit constants onto the model coefficients:
    /// `p0 = r_s`, `p1 = (r_s + r_t) / tau`, `p2 = 1 / tau`, `p3 = v_oc / tau`
    /// with `tau = r_t * c_t`.
    pub fn from_circuit(r_s: f64, r_t: f64, c_t: f64, v_oc: f64) -> Self {
        let tau = r_t * c_t;
        Self([r_s, (r_s + r_t) / tau, 1.0 / tau, v_oc / tau])
    }

    #[inline]
    pub fn dot(&self, regressor: &RegressorVector) -> f64 {
        self.0
            .iter()
            .zip(regressor.0.iter())
            .map(|(p, s)| p * s)
            .sum()
    }

    #[inline]
    pub fn as_array(&self) -> &[f64; 4] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Minimal memory carried between samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionState {
    pub voltage_predicted: f64,
    pub current_prev: f64,
    /// `None` until the first sample has been seen.
    pub timestamp_prev_us: Option<u64>,
}

/// Physical quantities derived from the parameter vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParams {
    pub r_steady_state: f64,
    pub r_transient: f64,
    pub voltage_open_circuit: f64,
}

/// Best internal-resistance sample of the current commit window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestEstimate {
    pub resistance: f64,
    pub error_magnitude: f64,
}

/// Per-sample diagnostic record, published for offline analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub timestamp_us: u64,
    pub voltage_measured: f64,
    pub current_measured: f64,
    pub voltage_predicted: f64,
    pub prediction_error: f64,
    /// Parameter vector used for this sample's prediction (before adaptation).
    pub params: [f64; 4],
    pub regressor: [f64; 4],
    pub r_steady_state: f64,
    pub r_transient: f64,
    pub voltage_open_circuit: f64,
    pub r_internal_sample: f64,
    /// False when the sample was screened out of best-estimate tracking.
    pub sample_accepted: bool,
    pub best_r_internal: Option<f64>,
    /// Value written to the store on this sample, if a commit fired.
    pub committed: Option<f64>,
}
