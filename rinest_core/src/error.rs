use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum EstimatorError {
    /// Registration with the telemetry bus failed; the estimator cannot start.
    #[error("telemetry subscription failed: {0}")]
    Subscription(String),
    #[error("telemetry source error: {0}")]
    Source(String),
    #[error("timeout waiting for telemetry")]
    Timeout,
    #[error("parameter store error: {0}")]
    Store(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing parameter store")]
    MissingStore,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
