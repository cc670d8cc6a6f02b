//! Common time helpers for rinest_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Compute the period in microseconds for a given sampling rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Elapsed seconds from `prev_us` to `now_us`, or `None` when the step is not
/// strictly forward in time (duplicate or reordered message).
#[inline]
pub fn dt_seconds(prev_us: u64, now_us: u64) -> Option<f64> {
    if now_us <= prev_us {
        return None;
    }
    Some((now_us - prev_us) as f64 / MICROS_PER_SEC as f64)
}

/// Convert a period in seconds to whole microseconds (rounded, at least 1).
#[inline]
pub fn seconds_to_us(s: f64) -> u64 {
    if !s.is_finite() || s <= 0.0 {
        return 1;
    }
    ((s * MICROS_PER_SEC as f64).round() as u64).max(1)
}
