//! Type-state builder for `Estimator` and the generic `build_estimator` constructor.
//!
//! `build()` only exists once a parameter store is supplied; `try_build()` is
//! available in every state and reports the missing piece at runtime.

use std::marker::PhantomData;

use rinest_traits::{ParamStore, Sample};

use crate::config::{AdaptationCfg, CommitCfg, ModelCfg};
use crate::core::{EstimatorCore, EstimatorStats};
use crate::error::{BuildError, Result};
use crate::status::StepOutcome;
use crate::tracker::TrackerState;
use crate::types::{BestEstimate, Diagnostics, ParameterVector, PhysicalParams};

/// Estimator over a boxed parameter store.
pub struct Estimator {
    pub(crate) inner: EstimatorCore<Box<dyn ParamStore>>,
}

impl core::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Estimator")
            .field("inner", &self.inner)
            .finish()
    }
}

impl Estimator {
    /// Start building an Estimator.
    pub fn builder() -> EstimatorBuilder<Missing> {
        EstimatorBuilder::default()
    }

    pub fn step(&mut self, sample: &Sample) -> Result<StepOutcome> {
        self.inner.step(sample)
    }

    pub fn read_diagnostics(&self) -> Option<&Diagnostics> {
        self.inner.read_diagnostics()
    }

    pub fn parameters(&self) -> &ParameterVector {
        self.inner.parameters()
    }

    pub fn physical(&self) -> PhysicalParams {
        self.inner.physical()
    }

    pub fn best_estimate(&self) -> Option<BestEstimate> {
        self.inner.best_estimate()
    }

    pub fn tracker_state(&self) -> TrackerState {
        self.inner.tracker_state()
    }

    pub fn committed_resistance(&self) -> Option<f64> {
        self.inner.committed_resistance()
    }

    pub fn stats(&self) -> &EstimatorStats {
        self.inner.stats()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.inner.set_enabled(enabled);
    }

    /// Borrow the underlying core, e.g. to hand it to `runner::run`.
    pub fn core_mut(&mut self) -> &mut EstimatorCore<Box<dyn ParamStore>> {
        &mut self.inner
    }

    /// Give back the parameter store.
    pub fn into_store(self) -> Box<dyn ParamStore> {
        self.inner.store
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Estimator`. All fields are validated on `build()`.
pub struct EstimatorBuilder<S> {
    store: Option<Box<dyn ParamStore>>,
    model: Option<ModelCfg>,
    adaptation: Option<AdaptationCfg>,
    commit: Option<CommitCfg>,
    enabled: Option<bool>,
    _s: PhantomData<S>,
}

impl Default for EstimatorBuilder<Missing> {
    fn default() -> Self {
        Self {
            store: None,
            model: None,
            adaptation: None,
            commit: None,
            enabled: None,
            _s: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Validate configuration and construct an `EstimatorCore`.
///
/// Shared by `EstimatorBuilder::try_build()` and `build_estimator()`.
fn validate_and_build<P: ParamStore>(
    store: P,
    model: ModelCfg,
    adaptation: AdaptationCfg,
    commit: CommitCfg,
    enabled: bool,
) -> Result<EstimatorCore<P>> {
    if !(model.r_series_ohm.is_finite() && model.r_series_ohm >= 0.0) {
        return Err(invalid("r_series_ohm must be finite and >= 0"));
    }
    if !(model.r_transient_ohm.is_finite() && model.r_transient_ohm > 0.0) {
        return Err(invalid("r_transient_ohm must be > 0"));
    }
    if !(model.c_transient_f.is_finite() && model.c_transient_f > 0.0) {
        return Err(invalid("c_transient_f must be > 0"));
    }
    if !model.v_open_circuit_v.is_finite() {
        return Err(invalid("v_open_circuit_v must be finite"));
    }
    if !model.nominal_parameters().is_finite() {
        return Err(invalid("nominal circuit yields non-finite model parameters"));
    }
    if adaptation.gains.iter().any(|g| !(g.is_finite() && *g >= 0.0)) {
        return Err(invalid("adaptation gains must be finite and >= 0"));
    }
    if !(adaptation.leakage.is_finite() && adaptation.leakage >= 0.0) {
        return Err(invalid("leakage must be finite and >= 0"));
    }
    if !(adaptation.min_abs_current_a.is_finite() && adaptation.min_abs_current_a >= 0.0) {
        return Err(invalid("min_abs_current_a must be finite and >= 0"));
    }
    if !(commit.period_s.is_finite() && commit.period_s > 0.0) {
        return Err(invalid("commit period must be > 0"));
    }
    if !(commit.resolution_ohm.is_finite() && commit.resolution_ohm > 0.0) {
        return Err(invalid("quantization resolution must be > 0"));
    }
    if !(commit.clamp_min_ohm.is_finite() && commit.clamp_max_ohm.is_finite()) {
        return Err(invalid("clamp bounds must be finite"));
    }
    if commit.clamp_min_ohm > commit.clamp_max_ohm {
        return Err(invalid("clamp_min_ohm must be <= clamp_max_ohm"));
    }
    if commit.param_key.trim().is_empty() {
        return Err(invalid("param_key must not be empty"));
    }

    Ok(EstimatorCore::new(store, model, adaptation, commit, enabled))
}

impl<S> EstimatorBuilder<S> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Estimator> {
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        let inner = validate_and_build(
            store,
            self.model.unwrap_or_default(),
            self.adaptation.unwrap_or_default(),
            self.commit.unwrap_or_default(),
            self.enabled.unwrap_or(true),
        )?;
        Ok(Estimator { inner })
    }

    pub fn with_model(mut self, model: ModelCfg) -> Self {
        self.model = Some(model);
        self
    }
    pub fn with_adaptation(mut self, adaptation: AdaptationCfg) -> Self {
        self.adaptation = Some(adaptation);
        self
    }
    pub fn with_commit(mut self, commit: CommitCfg) -> Self {
        self.commit = Some(commit);
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

impl EstimatorBuilder<Missing> {
    pub fn with_store(self, store: impl ParamStore + 'static) -> EstimatorBuilder<Set> {
        EstimatorBuilder {
            store: Some(Box::new(store)),
            model: self.model,
            adaptation: self.adaptation,
            commit: self.commit,
            enabled: self.enabled,
            _s: PhantomData,
        }
    }
}

impl EstimatorBuilder<Set> {
    /// Validate and build. Only available once a store is set.
    pub fn build(self) -> Result<Estimator> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type EstimatorG<P> = EstimatorCore<P>;

/// Build a statically-dispatched estimator over a concrete store.
pub fn build_estimator<P: ParamStore>(
    store: P,
    model: ModelCfg,
    adaptation: AdaptationCfg,
    commit: CommitCfg,
) -> Result<EstimatorG<P>> {
    validate_and_build(store, model, adaptation, commit, true)
}
