//! Telemetry sources and parameter stores for the estimator.
//!
//! - `sim::SimulatedBattery`: first-order Thevenin plant driven by a current profile
//! - `replay::ReplaySource`: recorded `timestamp_us,current_a,voltage_v` CSV logs
//! - `store::FileParamStore`: TOML-backed parameter store (or memory-only)
pub mod error;
pub mod replay;
pub mod sim;
pub mod store;

pub use error::TelemetryError;
pub use replay::ReplaySource;
pub use sim::{CurrentProfile, SimulatedBattery, TheveninPlant};
pub use store::FileParamStore;
