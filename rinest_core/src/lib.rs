#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Online battery internal-resistance estimation (host-agnostic).
//!
//! Telemetry arrives through `rinest_traits::TelemetrySource`; committed
//! estimates leave through `rinest_traits::ParamStore`.
//!
//! ## Pipeline
//!
//! - **Signal builder** (`signal`): regressor from current, its finite difference
//!   and the previous prediction
//! - **Voltage predictor** (`predictor`): Euler step of the adaptive Thevenin model plus leakage
//! - **Adaptation** (`adaptation`): MIT-rule gradient step on the parameter vector
//! - **Extraction** (`extract`): steady-state and transient resistance, open-circuit
//!   voltage, resistance sample
//! - **Tracker** (`tracker`): minimum-residual selector, reset by each commit
//! - **Commit** (`commit`): quantize, clamp, write, at most once per period
//!
//! `EstimatorCore::step` runs them in that order for each sample.

pub mod adaptation;
pub mod builder;
pub mod commit;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod extract;
pub mod mocks;
pub mod predictor;
pub mod runner;
pub mod sampler;
pub mod signal;
pub mod sink;
pub mod source_error;
pub mod status;
pub mod tracker;
pub mod types;
pub mod util;

pub use builder::{Estimator, EstimatorBuilder, EstimatorG, Missing, Set, build_estimator};
pub use config::{AdaptationCfg, CommitCfg, ModelCfg};
pub use crate::core::{EstimatorCore, EstimatorStats};
pub use error::{BuildError, EstimatorError, Report, Result};
pub use runner::{RunParams, RunSummary, SamplingMode, StopReason};
pub use sink::{DiagnosticSink, NullSink, TracingSink};
pub use status::{SkipReason, StepOutcome};
pub use tracker::TrackerState;
pub use types::{
    BestEstimate, Diagnostics, ParameterVector, PhysicalParams, PredictionState, RegressorVector,
};
