//! Outcome of feeding one sample to the estimator.

/// Why a sample was received but not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Duplicate or out-of-order timestamp (`dt <= 0`).
    NonPositiveDt,
    /// Current or voltage is NaN or infinite.
    NonFiniteSample,
}

/// Public status of a single `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Estimator disabled; the sample was dropped.
    Disabled,
    /// First sample: state recorded, commit timer started, nothing predicted.
    Warmup,
    /// Sample ignored; no state was touched.
    Skipped(SkipReason),
    /// Full pipeline ran.
    Updated,
    /// Full pipeline ran and this value was written to the parameter store.
    Committed(f64),
}

impl StepOutcome {
    /// True when the per-sample pipeline produced a fresh diagnostic record.
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Updated | Self::Committed(_))
    }
}
