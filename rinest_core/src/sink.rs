//! Diagnostic output: one record per processed sample, observational only.

use crate::types::Diagnostics;

pub trait DiagnosticSink {
    fn publish(&mut self, diagnostics: &Diagnostics);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Box<T> {
    fn publish(&mut self, diagnostics: &Diagnostics) {
        (**self).publish(diagnostics);
    }
}

/// Emits each record as a trace-level structured event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn publish(&mut self, d: &Diagnostics) {
        tracing::trace!(
            timestamp_us = d.timestamp_us,
            voltage_v = d.voltage_measured,
            current_a = d.current_measured,
            v_pred = d.voltage_predicted,
            residual = d.prediction_error,
            params = ?d.params,
            regressor = ?d.regressor,
            r_ss = d.r_steady_state,
            r_t = d.r_transient,
            voc = d.voltage_open_circuit,
            r_internal = d.r_internal_sample,
            accepted = d.sample_accepted,
            best = ?d.best_r_internal,
            committed = ?d.committed,
            "estimator diagnostics"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn publish(&mut self, _diagnostics: &Diagnostics) {}
}
