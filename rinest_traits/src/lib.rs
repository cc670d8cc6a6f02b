//! Seam traits shared by the estimator, its telemetry sources and its
//! parameter stores.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error type used at trait boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One battery telemetry message as delivered by the host bus.
///
/// Current is positive while discharging. Timestamps are monotonic
/// microseconds; duplicates and reordering are possible on a lossy bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_us: u64,
    pub current_a: f64,
    pub voltage_v: f64,
}

impl Sample {
    pub fn new(timestamp_us: u64, current_a: f64, voltage_v: f64) -> Self {
        Self {
            timestamp_us,
            current_a,
            voltage_v,
        }
    }
}

/// Stream of battery telemetry.
pub trait TelemetrySource {
    /// Register with the host bus. The estimator must not run when this fails.
    fn subscribe(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Block up to `timeout` for the next sample. `Ok(None)` ends the stream.
    fn next_sample(&mut self, timeout: std::time::Duration) -> Result<Option<Sample>, BoxError>;
}

/// Persistent key/value parameter storage with explicit commit.
pub trait ParamStore {
    fn get(&self, key: &str) -> Option<f64>;
    fn set(&mut self, key: &str, value: f64) -> Result<(), BoxError>;
    fn commit(&mut self) -> Result<(), BoxError>;
}

impl<P: ParamStore + ?Sized> ParamStore for Box<P> {
    fn get(&self, key: &str) -> Option<f64> {
        (**self).get(key)
    }
    fn set(&mut self, key: &str, value: f64) -> Result<(), BoxError> {
        (**self).set(key, value)
    }
    fn commit(&mut self) -> Result<(), BoxError> {
        (**self).commit()
    }
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn subscribe(&mut self) -> Result<(), BoxError> {
        (**self).subscribe()
    }
    fn next_sample(&mut self, timeout: std::time::Duration) -> Result<Option<Sample>, BoxError> {
        (**self).next_sample(timeout)
    }
}
