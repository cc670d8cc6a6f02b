//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "rinest",
    version,
    about = "Online battery internal-resistance estimator"
)]
pub struct Cli {
    /// Path to config TOML (typed). Nominal defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Options shared by every command that runs the estimator.
#[derive(Args, Debug, Clone)]
pub struct RunOpts {
    /// Write one JSON object per processed sample to FILE
    #[arg(long, value_name = "FILE")]
    pub diagnostics: Option<PathBuf>,
    /// Read telemetry inside the estimator loop instead of a sampler thread
    #[arg(long, action = ArgAction::SetTrue)]
    pub direct: bool,
    /// Stop after this many received samples
    #[arg(long, value_name = "N")]
    pub max_samples: Option<u64>,
    /// Print sample counters on completion
    #[arg(long, action = ArgAction::SetTrue)]
    pub stats: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the estimator against a simulated Thevenin battery
    Simulate {
        /// Simulated duration in seconds
        #[arg(long, value_name = "SECS", default_value_t = 60.0)]
        seconds: f64,
        /// Load current between pulses (A, positive = discharge)
        #[arg(long, value_name = "AMPS", default_value_t = 5.0)]
        current: f64,
        /// Pulse current (A); omit for a constant load
        #[arg(long, value_name = "AMPS")]
        pulse: Option<f64>,
        /// Pulse period in seconds
        #[arg(long, value_name = "SECS", default_value_t = 4.0)]
        pulse_period: f64,
        /// Fraction of each period spent at the pulse current
        #[arg(long, value_name = "FRACTION", default_value_t = 0.5)]
        duty: f64,
        /// True series resistance of the simulated cell (defaults to the model's nominal value)
        #[arg(long, value_name = "OHM")]
        r_series: Option<f64>,
        /// Gaussian noise on the voltage reading (V, standard deviation)
        #[arg(long, value_name = "VOLTS", default_value_t = 0.0)]
        noise: f64,
        /// Seed for the noise generator
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[command(flatten)]
        run: RunOpts,
    },
    /// Replay a recorded telemetry CSV (timestamp_us,current_a,voltage_v)
    Replay {
        /// Telemetry log to replay
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        #[command(flatten)]
        run: RunOpts,
    },
    /// Quick health check: config is valid and the estimator converges on a short simulation
    SelfCheck,
}
