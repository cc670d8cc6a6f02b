//! The per-sample estimation pipeline (`EstimatorCore`).
//!
//! Order of one processed sample:
//! regressor -> prediction -> extraction (pre-adaptation parameters) ->
//! best-estimate tracker -> commit policy -> adaptation -> state update ->
//! diagnostics.
//!
//! A sample with `dt <= 0` leaves every piece of state untouched.

use rinest_traits::{ParamStore, Sample};

use crate::adaptation::adapt;
use crate::commit::CommitPolicy;
use crate::config::{AdaptationCfg, ModelCfg};
use crate::error::Result;
use crate::extract::{internal_resistance, physical_params};
use crate::predictor::VoltagePredictor;
use crate::signal::build_regressor;
use crate::status::{SkipReason, StepOutcome};
use crate::tracker::{BestEstimateTracker, TrackerState};
use crate::types::{BestEstimate, Diagnostics, ParameterVector, PhysicalParams, PredictionState};
use crate::util::dt_seconds;

/// Counters over the estimator lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstimatorStats {
    pub received: u64,
    pub processed: u64,
    pub skipped: u64,
    /// Processed samples kept away from the tracker (tiny current, non-finite resistance).
    pub screened: u64,
    pub commits: u64,
    pub store_errors: u64,
}

/// Unified core for both the boxed `Estimator` and the generic `EstimatorG`.
pub struct EstimatorCore<P: ParamStore> {
    pub(crate) store: P,
    pub(crate) enabled: bool,
    pub(crate) model: ModelCfg,
    pub(crate) adaptation: AdaptationCfg,
    pub(crate) predictor: VoltagePredictor,
    pub(crate) tracker: BestEstimateTracker,
    pub(crate) commit: CommitPolicy,
    pub(crate) diagnostics: Option<Diagnostics>,
    pub(crate) stats: EstimatorStats,
}

impl<P: ParamStore> core::fmt::Debug for EstimatorCore<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EstimatorCore")
            .field("enabled", &self.enabled)
            .field("params", self.predictor.params().as_array())
            .field("tracker", &self.tracker.state())
            .field("committed", &self.commit.committed())
            .finish_non_exhaustive()
    }
}

impl<P: ParamStore> EstimatorCore<P> {
    pub(crate) fn new(
        store: P,
        model: ModelCfg,
        adaptation: AdaptationCfg,
        commit: crate::config::CommitCfg,
        enabled: bool,
    ) -> Self {
        let prior = store.get(&commit.param_key).filter(|v| v.is_finite());
        if let Some(value) = prior {
            tracing::info!(key = %commit.param_key, value, "resuming from stored resistance");
        }
        let predictor = VoltagePredictor::new(
            model.nominal_parameters(),
            model.v_open_circuit_v,
            adaptation.leakage,
        );
        Self {
            store,
            enabled,
            model,
            adaptation,
            predictor,
            tracker: BestEstimateTracker::new(),
            commit: CommitPolicy::new(commit, prior),
            diagnostics: None,
            stats: EstimatorStats::default(),
        }
    }

    /// Feed one telemetry sample through the pipeline.
    ///
    /// A failed store write still completes the pipeline for this sample
    /// before the error is returned.
    pub fn step(&mut self, sample: &Sample) -> Result<StepOutcome> {
        self.stats.received += 1;
        if !self.enabled {
            return Ok(StepOutcome::Disabled);
        }
        if !(sample.current_a.is_finite() && sample.voltage_v.is_finite()) {
            self.stats.skipped += 1;
            tracing::debug!(
                timestamp_us = sample.timestamp_us,
                current_a = sample.current_a,
                voltage_v = sample.voltage_v,
                "non-finite sample skipped"
            );
            return Ok(StepOutcome::Skipped(SkipReason::NonFiniteSample));
        }

        let state = *self.predictor.state();
        let Some(prev_us) = state.timestamp_prev_us else {
            self.predictor.record(sample.current_a, sample.timestamp_us);
            self.commit.start(sample.timestamp_us);
            tracing::debug!(timestamp_us = sample.timestamp_us, "first sample; estimator armed");
            return Ok(StepOutcome::Warmup);
        };
        let Some(dt) = dt_seconds(prev_us, sample.timestamp_us) else {
            self.stats.skipped += 1;
            tracing::debug!(
                prev_us,
                timestamp_us = sample.timestamp_us,
                "non-positive dt; sample skipped"
            );
            return Ok(StepOutcome::Skipped(SkipReason::NonPositiveDt));
        };

        let regressor = build_regressor(
            sample.current_a,
            state.current_prev,
            dt,
            state.voltage_predicted,
        );
        let prediction = self.predictor.predict(&regressor, sample.voltage_v, dt);

        let params_used = *self.predictor.params();
        let physical = physical_params(&params_used);
        let r_sample = internal_resistance(
            sample.voltage_v,
            physical.voltage_open_circuit,
            sample.current_a,
        );

        let accepted = sample.current_a.abs() >= self.adaptation.min_abs_current_a
            && r_sample.is_finite()
            && prediction.error.is_finite();
        if accepted {
            self.tracker.offer(r_sample, prediction.error);
        } else {
            self.stats.screened += 1;
        }

        let commit_result = self.commit.maybe_commit(
            sample.timestamp_us,
            &mut self.tracker,
            &mut self.store,
        );

        adapt(
            self.predictor.params_mut(),
            &self.adaptation.gains,
            prediction.error,
            &regressor,
            dt,
        );
        self.predictor.advance(&prediction, sample.current_a, sample.timestamp_us);
        self.stats.processed += 1;

        let committed = match &commit_result {
            Ok(v) => *v,
            Err(_) => None,
        };
        self.diagnostics = Some(Diagnostics {
            timestamp_us: sample.timestamp_us,
            voltage_measured: sample.voltage_v,
            current_measured: sample.current_a,
            voltage_predicted: prediction.voltage_predicted,
            prediction_error: prediction.error,
            params: *params_used.as_array(),
            regressor: *regressor.as_array(),
            r_steady_state: physical.r_steady_state,
            r_transient: physical.r_transient,
            voltage_open_circuit: physical.voltage_open_circuit,
            r_internal_sample: r_sample,
            sample_accepted: accepted,
            best_r_internal: self.tracker.best().map(|b| b.resistance),
            committed,
        });

        match commit_result {
            Ok(Some(value)) => {
                self.stats.commits += 1;
                Ok(StepOutcome::Committed(value))
            }
            Ok(None) => Ok(StepOutcome::Updated),
            Err(e) => {
                self.stats.store_errors += 1;
                Err(eyre::Report::new(e).wrap_err("committing internal resistance"))
            }
        }
    }

    /// Diagnostic record of the most recently processed sample.
    pub fn read_diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    pub fn parameters(&self) -> &ParameterVector {
        self.predictor.params()
    }

    /// Physical quantities implied by the current parameter vector.
    pub fn physical(&self) -> PhysicalParams {
        physical_params(self.predictor.params())
    }

    pub fn prediction_state(&self) -> &PredictionState {
        self.predictor.state()
    }

    pub fn best_estimate(&self) -> Option<BestEstimate> {
        self.tracker.best()
    }

    pub fn tracker_state(&self) -> TrackerState {
        self.tracker.state()
    }

    /// Last committed (or resumed) internal resistance.
    pub fn committed_resistance(&self) -> Option<f64> {
        self.commit.committed()
    }

    pub fn stats(&self) -> &EstimatorStats {
        &self.stats
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle processing. Disabling keeps the adapted parameters; re-enabling
    /// re-arms the pipeline so the next sample is a warm-up and the gap spent
    /// disabled is never integrated as one step.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        tracing::info!(enabled, "estimator enable flag changed");
        if enabled {
            self.predictor.rearm();
            self.commit.rearm();
        }
        self.enabled = enabled;
    }

    pub fn model_cfg(&self) -> &ModelCfg {
        &self.model
    }

    pub fn adaptation_cfg(&self) -> &AdaptationCfg {
        &self.adaptation
    }

    pub fn commit_cfg(&self) -> &crate::config::CommitCfg {
        self.commit.cfg()
    }

    pub fn store(&self) -> &P {
        &self.store
    }
}
