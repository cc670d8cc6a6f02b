//! Terminal-voltage predictor.
//!
//! One explicit-Euler step of the adaptive model followed by a leakage
//! correction that pulls the prediction toward the measurement:
//!
//! ```text
//! v_pred  = v_pred_prev + dot(p, s) * dt
//! e       = v_meas - v_pred
//! v_pred += lambda * dt * e
//! ```

use crate::types::{ParameterVector, PredictionState, RegressorVector};

/// Output of one prediction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Prediction after the leakage correction; becomes the next step's `v_pred_prev`.
    pub voltage_predicted: f64,
    /// Residual `v_meas - v_pred`, taken before the leakage correction.
    pub error: f64,
}

#[derive(Debug, Clone)]
pub struct VoltagePredictor {
    params: ParameterVector,
    state: PredictionState,
    leakage: f64,
}

impl VoltagePredictor {
    pub fn new(params: ParameterVector, initial_voltage: f64, leakage: f64) -> Self {
        Self {
            params,
            state: PredictionState {
                voltage_predicted: initial_voltage,
                current_prev: 0.0,
                timestamp_prev_us: None,
            },
            leakage,
        }
    }

    /// Predict without touching state.
    pub fn predict(
        &self,
        regressor: &RegressorVector,
        voltage_measured: f64,
        dt: f64,
    ) -> Prediction {
        let open_loop = self.state.voltage_predicted + self.params.dot(regressor) * dt;
        let error = voltage_measured - open_loop;
        Prediction {
            voltage_predicted: open_loop + self.leakage * dt * error,
            error,
        }
    }

    /// Commit the end-of-pipeline state for the processed sample.
    pub fn advance(&mut self, prediction: &Prediction, current: f64, timestamp_us: u64) {
        self.state.voltage_predicted = prediction.voltage_predicted;
        self.record(current, timestamp_us);
    }

    /// Remember a sample without predicting (first sample of the stream).
    pub fn record(&mut self, current: f64, timestamp_us: u64) {
        self.state.current_prev = current;
        self.state.timestamp_prev_us = Some(timestamp_us);
    }

    /// Forget the previous sample so the next one only seeds state again.
    /// Parameters and the last prediction are kept.
    pub fn rearm(&mut self) {
        self.state.timestamp_prev_us = None;
    }

    pub fn params(&self) -> &ParameterVector {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterVector {
        &mut self.params
    }

    pub fn state(&self) -> &PredictionState {
        &self.state
    }
}
