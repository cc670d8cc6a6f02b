#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas, telemetry CSV parsing and the persisted parameter file.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional; an empty file yields the nominal defaults.
//! - The telemetry CSV loader enforces headers so recorded logs replay
//!   with the right column meaning.
//! - `PersistedParams` is the on-disk form of the parameter store.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

mod atomic;

pub use atomic::write_atomic;

/// Telemetry CSV schema.
///
/// Expected headers:
/// timestamp_us,current_a,voltage_v
///
/// Example:
/// timestamp_us,current_a,voltage_v
/// 1000000,5.0,21.4
/// 1020000,5.1,21.39
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TelemetryRow {
    pub timestamp_us: u64,
    pub current_a: f64,
    pub voltage_v: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EstimatorCfg {
    /// Master enable; when false, samples are received but never processed.
    pub enabled: bool,
}

impl Default for EstimatorCfg {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Nominal first-order Thevenin circuit used to seed the parameter vector.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModelCfg {
    pub r_series_ohm: f64,
    pub r_transient_ohm: f64,
    pub c_transient_f: f64,
    pub v_open_circuit_v: f64,
}

impl Default for ModelCfg {
    fn default() -> Self {
        Self {
            r_series_ohm: 0.1,
            r_transient_ohm: 0.05,
            c_transient_f: 500.0,
            v_open_circuit_v: 22.1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdaptationCfg {
    /// Per-component gradient gains `mu[0..3]`.
    pub gains: [f64; 4],
    /// Leakage gain pulling the prediction toward the measurement.
    pub leakage: f64,
    /// Samples with |current| below this are logged but never become the best estimate.
    pub min_abs_current_a: f64,
}

impl Default for AdaptationCfg {
    fn default() -> Self {
        Self {
            gains: [1e-4; 4],
            leakage: 0.8,
            min_abs_current_a: 1e-3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CommitCfg {
    /// Seconds between commits of the best estimate.
    pub period_s: f64,
    /// Quantization step in ohms (0.01 or 0.1 are typical).
    pub resolution_ohm: f64,
    pub clamp_min_ohm: f64,
    pub clamp_max_ohm: f64,
    /// Parameter store key receiving the committed resistance.
    pub param_key: String,
}

impl Default for CommitCfg {
    fn default() -> Self {
        Self {
            period_s: 10.0,
            resolution_ohm: 0.01,
            clamp_min_ohm: 0.01,
            clamp_max_ohm: 0.2,
            param_key: "BAT1_R_INTERNAL".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Background thread forwards samples as soon as the source yields them.
    #[default]
    Event,
    /// Background thread paced at `sample_rate_hz`.
    Paced,
    /// Pull samples inside the estimator loop.
    Direct,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    /// Nominal telemetry rate; also the simulator rate and the paced-mode rate.
    pub sample_rate_hz: u32,
    /// Per-read timeout (ms). Also accepts alias "sample_ms".
    #[serde(alias = "sample_ms")]
    pub timeout_ms: u64,
    pub mode: RunMode,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            sample_rate_hz: 50,
            timeout_ms: 100,
            mode: RunMode::Event,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StoreCfg {
    /// Parameter file (TOML). When absent the store lives in memory only.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub estimator: EstimatorCfg,
    pub model: ModelCfg,
    pub adaptation: AdaptationCfg,
    pub commit: CommitCfg,
    pub source: SourceCfg,
    pub store: StoreCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Model
        let m = &self.model;
        if !(m.r_series_ohm.is_finite() && m.r_series_ohm >= 0.0) {
            eyre::bail!("model.r_series_ohm must be finite and >= 0");
        }
        if !(m.r_transient_ohm.is_finite() && m.r_transient_ohm > 0.0) {
            eyre::bail!("model.r_transient_ohm must be > 0");
        }
        if !(m.c_transient_f.is_finite() && m.c_transient_f > 0.0) {
            eyre::bail!("model.c_transient_f must be > 0");
        }
        if !m.v_open_circuit_v.is_finite() {
            eyre::bail!("model.v_open_circuit_v must be finite");
        }

        // Adaptation
        for (i, g) in self.adaptation.gains.iter().enumerate() {
            if !(g.is_finite() && *g >= 0.0) {
                eyre::bail!("adaptation.gains[{i}] must be finite and >= 0");
            }
        }
        if !(self.adaptation.leakage.is_finite() && self.adaptation.leakage >= 0.0) {
            eyre::bail!("adaptation.leakage must be finite and >= 0");
        }
        if !(self.adaptation.min_abs_current_a.is_finite()
            && self.adaptation.min_abs_current_a >= 0.0)
        {
            eyre::bail!("adaptation.min_abs_current_a must be finite and >= 0");
        }

        // Commit
        let c = &self.commit;
        if !(c.period_s.is_finite() && c.period_s > 0.0) {
            eyre::bail!("commit.period_s must be > 0");
        }
        if c.period_s > 24.0 * 60.0 * 60.0 {
            eyre::bail!("commit.period_s is unreasonably large (>24h)");
        }
        if !(c.resolution_ohm.is_finite() && c.resolution_ohm > 0.0) {
            eyre::bail!("commit.resolution_ohm must be > 0");
        }
        if !(c.clamp_min_ohm.is_finite() && c.clamp_max_ohm.is_finite()) {
            eyre::bail!("commit clamp bounds must be finite");
        }
        if c.clamp_min_ohm > c.clamp_max_ohm {
            eyre::bail!("commit.clamp_min_ohm must be <= commit.clamp_max_ohm");
        }
        if c.param_key.trim().is_empty() {
            eyre::bail!("commit.param_key must not be empty");
        }

        // Source
        if self.source.sample_rate_hz == 0 {
            eyre::bail!("source.sample_rate_hz must be > 0");
        }
        if self.source.timeout_ms == 0 {
            eyre::bail!("source.timeout_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

pub fn load_telemetry_csv(path: &Path) -> eyre::Result<Vec<TelemetryRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open telemetry CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["timestamp_us", "current_a", "voltage_v"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "telemetry CSV must have headers 'timestamp_us,current_a,voltage_v', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<TelemetryRow>().enumerate() {
        match rec {
            Ok(row) => {
                if !(row.current_a.is_finite() && row.voltage_v.is_finite()) {
                    eyre::bail!("telemetry CSV row {} has non-finite values", idx + 2);
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

/// On-disk form of the parameter store.
///
/// ```toml
/// [params]
/// BAT1_R_INTERNAL = 0.05
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedParams {
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

/// Load the parameter file; a missing file is an empty store.
pub fn load_params_file(path: &Path) -> eyre::Result<PersistedParams> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(PersistedParams::default());
        }
        Err(e) => eyre::bail!("read parameter file {:?}: {}", path, e),
    };
    toml::from_str(&text).map_err(|e| eyre::eyre!("parse parameter file {:?}: {}", path, e))
}

pub fn save_params_file(path: &Path, params: &PersistedParams) -> eyre::Result<()> {
    let text = toml::to_string(params)
        .map_err(|e| eyre::eyre!("serialize parameter file {:?}: {}", path, e))?;
    write_atomic(path, text.as_bytes())
        .map_err(|e| eyre::eyre!("write parameter file {:?}: {}", path, e))
}
