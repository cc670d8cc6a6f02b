//! Maps `Box<dyn Error>` from trait boundaries to typed `EstimatorError`.
//!
//! With the `telemetry-errors` feature, `rinest_telemetry::TelemetryError`
//! is downcast for precise mapping; otherwise the message text decides.

use crate::error::EstimatorError;

pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> EstimatorError {
    #[cfg(feature = "telemetry-errors")]
    {
        use rinest_telemetry::error::TelemetryError;
        if let Some(te) = e.downcast_ref::<TelemetryError>() {
            return match te {
                TelemetryError::Timeout => EstimatorError::Timeout,
                TelemetryError::Unavailable(msg) => EstimatorError::Subscription(msg.clone()),
                TelemetryError::Store(msg) => EstimatorError::Store(msg.clone()),
                other => EstimatorError::Source(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        EstimatorError::Timeout
    } else {
        EstimatorError::Source(s)
    }
}
