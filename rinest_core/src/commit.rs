//! Periodic quantize / clamp / commit of the tracked best estimate.
//!
//! This is the only place where an estimate reaches the parameter store.
//! Every written value has passed through `clamp_to`.

use rinest_traits::ParamStore;

use crate::config::CommitCfg;
use crate::error::EstimatorError;
use crate::tracker::BestEstimateTracker;

/// Round `value` to the nearest multiple of `resolution`. Idempotent.
#[inline]
pub fn quantize(value: f64, resolution: f64) -> f64 {
    (value / resolution).round() * resolution
}

/// Clamp into `[min, max]`. Callers guarantee `min <= max`.
#[inline]
pub fn clamp_to(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

/// Quantize then clamp. Non-finite input yields `None`: NaN has no admissible image.
pub fn quantize_and_clamp(value: f64, cfg: &CommitCfg) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    let q = quantize(value, cfg.resolution_ohm);
    let out = clamp_to(q, cfg.clamp_min_ohm, cfg.clamp_max_ohm);
    out.is_finite().then_some(out)
}

#[derive(Debug, Clone)]
pub struct CommitPolicy {
    cfg: CommitCfg,
    period_us: u64,
    last_commit_us: Option<u64>,
    committed: Option<f64>,
}

impl CommitPolicy {
    pub fn new(cfg: CommitCfg, committed: Option<f64>) -> Self {
        let period_us = crate::util::seconds_to_us(cfg.period_s);
        Self {
            cfg,
            period_us,
            last_commit_us: None,
            committed,
        }
    }

    pub fn cfg(&self) -> &CommitCfg {
        &self.cfg
    }

    /// Last value written (or read back from the store at start).
    pub fn committed(&self) -> Option<f64> {
        self.committed
    }

    pub fn last_commit_us(&self) -> Option<u64> {
        self.last_commit_us
    }

    /// Start the commit timer at the first observed sample.
    pub fn start(&mut self, now_us: u64) {
        if self.last_commit_us.is_none() {
            self.last_commit_us = Some(now_us);
        }
    }

    /// Stop the timer; the next `start` opens a fresh window.
    pub fn rearm(&mut self) {
        self.last_commit_us = None;
    }

    pub fn is_due(&self, now_us: u64) -> bool {
        match self.last_commit_us {
            Some(last) => now_us.saturating_sub(last) >= self.period_us,
            None => false,
        }
    }

    /// Commit the window's best estimate when the period has elapsed.
    ///
    /// Closing a window always restarts the timer and resets the tracker, even
    /// when nothing was accepted in it or the store write fails.
    pub fn maybe_commit<P: ParamStore + ?Sized>(
        &mut self,
        now_us: u64,
        tracker: &mut BestEstimateTracker,
        store: &mut P,
    ) -> Result<Option<f64>, EstimatorError> {
        if self.last_commit_us.is_none() {
            self.start(now_us);
            return Ok(None);
        }
        if !self.is_due(now_us) {
            return Ok(None);
        }

        self.last_commit_us = Some(now_us);
        let candidate = tracker.window_best();
        tracker.reset();

        let Some(best) = candidate else {
            tracing::debug!(now_us, "commit window closed without an accepted estimate");
            return Ok(None);
        };
        let Some(value) = quantize_and_clamp(best.resistance, &self.cfg) else {
            tracing::debug!(
                resistance = best.resistance,
                "best estimate not representable; nothing committed"
            );
            return Ok(None);
        };

        store
            .set(&self.cfg.param_key, value)
            .map_err(|e| EstimatorError::Store(e.to_string()))?;
        store
            .commit()
            .map_err(|e| EstimatorError::Store(e.to_string()))?;
        self.committed = Some(value);
        tracing::info!(
            key = %self.cfg.param_key,
            r_internal = value,
            raw = best.resistance,
            error = best.error_magnitude,
            "internal resistance committed"
        );
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MemoryStore;

    fn cfg(period_s: f64) -> CommitCfg {
        CommitCfg {
            period_s,
            ..CommitCfg::default()
        }
    }

    #[test]
    fn quantize_rounds_to_resolution_and_is_idempotent() {
        assert!((quantize(0.123, 0.01) - 0.12).abs() < 1e-12);
        assert!((quantize(0.125_1, 0.01) - 0.13).abs() < 1e-12);
        assert!((quantize(0.16, 0.1) - 0.2).abs() < 1e-12);
        for v in [0.123, -0.456, 0.199_9, 3.0] {
            let q = quantize(v, 0.01);
            assert_eq!(quantize(q, 0.01), q);
        }
    }

    #[test]
    fn quantize_and_clamp_screens_non_finite() {
        let c = CommitCfg::default();
        assert_eq!(quantize_and_clamp(f64::NAN, &c), None);
        assert_eq!(quantize_and_clamp(f64::INFINITY, &c), Some(0.2));
        assert_eq!(quantize_and_clamp(f64::NEG_INFINITY, &c), Some(0.01));
        assert_eq!(quantize_and_clamp(-3.0, &c), Some(0.01));
        assert_eq!(quantize_and_clamp(0.9, &c), Some(0.2));
    }

    #[test]
    fn first_call_only_starts_the_timer() {
        let mut policy = CommitPolicy::new(cfg(1.0), None);
        let mut tracker = BestEstimateTracker::new();
        let mut store = MemoryStore::default();
        tracker.offer(0.05, 0.1);
        let out = policy.maybe_commit(5_000_000, &mut tracker, &mut store).unwrap();
        assert_eq!(out, None);
        assert_eq!(policy.last_commit_us(), Some(5_000_000));
        assert_eq!(store.commits(), 0);
    }

    #[test]
    fn commits_quantized_clamped_value_after_period() {
        let mut policy = CommitPolicy::new(cfg(1.0), None);
        let mut tracker = BestEstimateTracker::new();
        let mut store = MemoryStore::default();
        policy.start(0);

        tracker.offer(0.0734, 0.1);
        let early = policy.maybe_commit(999_999, &mut tracker, &mut store).unwrap();
        assert_eq!(early, None);
        let v = policy
            .maybe_commit(1_000_000, &mut tracker, &mut store)
            .unwrap()
            .expect("commit fires");
        assert!((v - 0.07).abs() < 1e-12);
        assert_eq!(store.get("BAT1_R_INTERNAL"), Some(v));
        assert_eq!(store.commits(), 1);
        assert_eq!(tracker.state(), crate::tracker::TrackerState::JustReset);
        assert_eq!(policy.committed(), Some(v));
    }

    #[test]
    fn empty_window_writes_nothing_but_restarts_timer() {
        let mut policy = CommitPolicy::new(cfg(1.0), Some(0.05));
        let mut tracker = BestEstimateTracker::new();
        let mut store = MemoryStore::default();
        policy.start(0);
        let out = policy.maybe_commit(2_000_000, &mut tracker, &mut store).unwrap();
        assert_eq!(out, None);
        assert_eq!(policy.last_commit_us(), Some(2_000_000));
        assert_eq!(store.commits(), 0);
        assert_eq!(policy.committed(), Some(0.05));
    }

    #[test]
    fn rearm_restarts_the_window_at_the_next_sample() {
        let mut policy = CommitPolicy::new(cfg(1.0), None);
        let mut tracker = BestEstimateTracker::new();
        let mut store = MemoryStore::default();
        policy.start(0);
        policy.rearm();
        assert_eq!(policy.last_commit_us(), None);
        assert!(!policy.is_due(3_600_000_000));
        policy.start(3_600_000_000);
        tracker.offer(0.05, 0.1);
        let out = policy.maybe_commit(3_600_500_000, &mut tracker, &mut store).unwrap();
        assert_eq!(out, None);
        assert_eq!(store.commits(), 0);
    }

    #[test]
    fn store_failure_is_reported_and_window_still_closes() {
        let mut policy = CommitPolicy::new(cfg(1.0), None);
        let mut tracker = BestEstimateTracker::new();
        let mut store = MemoryStore::failing();
        policy.start(0);
        tracker.offer(0.05, 0.1);
        let err = policy
            .maybe_commit(1_000_000, &mut tracker, &mut store)
            .expect_err("store fails");
        assert!(matches!(err, EstimatorError::Store(_)));
        assert_eq!(tracker.state(), crate::tracker::TrackerState::JustReset);
        assert_eq!(policy.committed(), None);
    }
}
