//! Time source for the sampler threads.
//!
//! Readings are plain microseconds on the clock's own scale so the sampler
//! can compare them across threads without holding an `Instant`.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Whole microseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn duration_to_us(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Paces the sampler thread and records when it last forwarded a sample.
pub trait Clock {
    /// Microseconds since this clock's origin. Never decreases.
    fn now_us(&self) -> u64;
    fn sleep(&self, d: Duration);
}

/// Wall time measured from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_us(&self) -> u64 {
        duration_to_us(self.origin.elapsed())
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

/// Clock that only moves when told to. `sleep` advances it instead of
/// blocking, so paced sampling runs as fast as the consumer reads.
///
/// Clones share one reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed_us: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        let step = duration_to_us(d);
        let _ = self
            .elapsed_us
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| {
                Some(t.saturating_add(step))
            });
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.now_us())
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.elapsed_us.load(Ordering::Relaxed)
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
