//! Minimum-residual selector for the internal-resistance estimate.
//!
//! A lower prediction error is taken as a more trustworthy model, so the
//! resistance sampled at the lowest |error| of the commit window wins.
//! The selector is reset by each commit instead of decaying.

use crate::types::BestEstimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// The next offered sample is accepted unconditionally.
    JustReset,
    /// Only samples with |error| <= best |error| replace the estimate.
    Tracking,
}

#[derive(Debug, Clone)]
pub struct BestEstimateTracker {
    state: TrackerState,
    best: Option<BestEstimate>,
}

impl Default for BestEstimateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BestEstimateTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::JustReset,
            best: None,
        }
    }

    /// Offer a `(resistance, prediction_error)` pair. Returns true when it became the best.
    pub fn offer(&mut self, resistance: f64, prediction_error: f64) -> bool {
        let error_magnitude = prediction_error.abs();
        let accept = match (self.state, self.best) {
            (TrackerState::JustReset, _) | (TrackerState::Tracking, None) => true,
            (TrackerState::Tracking, Some(best)) => error_magnitude <= best.error_magnitude,
        };
        if accept {
            self.best = Some(BestEstimate {
                resistance,
                error_magnitude,
            });
            self.state = TrackerState::Tracking;
        }
        accept
    }

    /// Enter `JustReset`. The previous best stays readable until replaced.
    pub fn reset(&mut self) {
        self.state = TrackerState::JustReset;
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Most recent best estimate, including one carried over from a previous window.
    pub fn best(&self) -> Option<BestEstimate> {
        self.best
    }

    /// Best estimate accepted since the last reset, if any.
    pub fn window_best(&self) -> Option<BestEstimate> {
        match self.state {
            TrackerState::Tracking => self.best,
            TrackerState::JustReset => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_offer_is_accepted_unconditionally() {
        let mut t = BestEstimateTracker::new();
        assert_eq!(t.state(), TrackerState::JustReset);
        assert!(t.offer(0.5, 100.0));
        assert_eq!(t.state(), TrackerState::Tracking);
        assert_eq!(t.best().map(|b| b.error_magnitude), Some(100.0));
    }

    #[test]
    fn tracking_keeps_minimum_error_magnitude() {
        let mut t = BestEstimateTracker::new();
        t.offer(0.10, 0.3);
        assert!(!t.offer(0.20, -0.4));
        assert!(t.offer(0.05, -0.2));
        // ties replace
        assert!(t.offer(0.06, 0.2));
        assert!(!t.offer(0.07, 0.21));
        let best = t.window_best().expect("best");
        assert_eq!(best.resistance, 0.06);
        assert_eq!(best.error_magnitude, 0.2);
    }

    #[test]
    fn reset_forces_acceptance_of_worse_sample() {
        let mut t = BestEstimateTracker::new();
        t.offer(0.05, 0.001);
        t.reset();
        assert_eq!(t.window_best(), None);
        assert_eq!(t.best().map(|b| b.resistance), Some(0.05));
        assert!(t.offer(0.15, 5.0));
        assert_eq!(t.window_best().map(|b| b.resistance), Some(0.15));
    }
}
