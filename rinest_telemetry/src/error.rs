use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry read timeout")]
    Timeout,
    /// The requested topic or log cannot be subscribed to.
    #[error("telemetry unavailable: {0}")]
    Unavailable(String),
    #[error("telemetry log corrupt: {0}")]
    Corrupt(String),
    #[error("invalid simulator setting: {0}")]
    InvalidSetting(&'static str),
    #[error("parameter store: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
