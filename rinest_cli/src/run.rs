//! Command execution: wire config, telemetry source, parameter store and sink
//! into one estimator run, then report where it ended.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use rinest_config::Config;
use rinest_core::{
    EstimatorCore, NullSink, RunParams, RunSummary, SamplingMode, TracingSink, build_estimator,
};
use rinest_telemetry::{
    CurrentProfile, FileParamStore, ReplaySource, SimulatedBattery, TheveninPlant,
};
use rinest_traits::{ParamStore, TelemetrySource};
use serde_json::json;

use crate::cli::RunOpts;
use crate::sink::JsonlSink;

/// Simulated load and plant for `simulate`.
#[derive(Debug, Clone, Copy)]
pub struct SimSettings {
    pub seconds: f64,
    pub current: f64,
    pub pulse: Option<f64>,
    pub pulse_period: f64,
    pub duty: f64,
    pub r_series: Option<f64>,
    pub noise: f64,
    pub seed: u64,
}

fn plant_from(cfg: &Config, r_series: Option<f64>) -> TheveninPlant {
    TheveninPlant {
        r_series_ohm: r_series.unwrap_or(cfg.model.r_series_ohm),
        r_transient_ohm: cfg.model.r_transient_ohm,
        c_transient_f: cfg.model.c_transient_f,
        v_open_circuit_v: cfg.model.v_open_circuit_v,
    }
}

fn simulated_source(cfg: &Config, sim: &SimSettings) -> eyre::Result<SimulatedBattery> {
    if !(sim.seconds.is_finite() && sim.seconds > 0.0) {
        eyre::bail!("--seconds must be a positive number");
    }
    let profile = match sim.pulse {
        Some(pulse_a) => CurrentProfile::Pulse {
            base_a: sim.current,
            pulse_a,
            period_s: sim.pulse_period,
            duty: sim.duty,
        },
        None => CurrentProfile::Constant(sim.current),
    };
    let hz = cfg.source.sample_rate_hz;
    let samples = (sim.seconds * f64::from(hz)).round().max(1.0) as u64;
    let battery = SimulatedBattery::new(plant_from(cfg, sim.r_series), profile, hz)
        .wrap_err("configure simulated battery")?
        .with_samples(samples)
        .with_noise(sim.noise, sim.seed)
        .wrap_err("configure simulated battery")?;
    tracing::info!(
        samples,
        hz,
        r_series = battery.plant().r_series_ohm,
        ?profile,
        noise = sim.noise,
        "simulated battery ready"
    );
    Ok(battery)
}

fn open_store(cfg: &Config) -> eyre::Result<FileParamStore> {
    match cfg.store.path.as_deref() {
        Some(p) => FileParamStore::open(p).wrap_err("open parameter store"),
        None => Ok(FileParamStore::in_memory()),
    }
}

fn estimator_for<P: ParamStore>(cfg: &Config, store: P) -> eyre::Result<EstimatorCore<P>> {
    let mut estimator = build_estimator(
        store,
        (&cfg.model).into(),
        (&cfg.adaptation).into(),
        (&cfg.commit).into(),
    )?;
    estimator.set_enabled(cfg.estimator.enabled);
    Ok(estimator)
}

fn run_params(cfg: &Config, opts: &RunOpts, shutdown: Arc<AtomicBool>) -> RunParams {
    let mode = if opts.direct {
        SamplingMode::Direct
    } else {
        SamplingMode::from(&cfg.source)
    };
    RunParams {
        mode,
        timeout: Duration::from_millis(cfg.source.timeout_ms),
        max_samples: opts.max_samples,
        shutdown: Some(shutdown),
        ..RunParams::default()
    }
}

/// Run the estimator over `source` with the configured store, printing the
/// outcome to stdout.
fn execute<S>(
    cfg: &Config,
    source: S,
    opts: &RunOpts,
    shutdown: Arc<AtomicBool>,
    json_mode: bool,
) -> eyre::Result<RunSummary>
where
    S: TelemetrySource + Send + 'static,
{
    let mut estimator = estimator_for(cfg, open_store(cfg)?)?;
    let params = run_params(cfg, opts, shutdown);

    let (summary, written) = match opts.diagnostics.as_deref() {
        Some(path) => {
            let mut sink = JsonlSink::create(path)?;
            let summary = rinest_core::runner::run(source, &mut estimator, &mut sink, &params)?;
            let written = sink.finish()?;
            tracing::info!(path = %path.display(), records = written, "diagnostics written");
            (summary, Some(written))
        }
        None => {
            let mut sink = TracingSink;
            let summary = rinest_core::runner::run(source, &mut estimator, &mut sink, &params)?;
            (summary, None)
        }
    };

    report(&summary, written, json_mode);
    if opts.stats {
        print_stats(&summary);
    }
    Ok(summary)
}

pub fn simulate(
    cfg: &Config,
    sim: &SimSettings,
    opts: &RunOpts,
    shutdown: Arc<AtomicBool>,
    json_mode: bool,
) -> eyre::Result<RunSummary> {
    let source = simulated_source(cfg, sim)?;
    execute(cfg, source, opts, shutdown, json_mode)
}

pub fn replay(
    cfg: &Config,
    input: &Path,
    opts: &RunOpts,
    shutdown: Arc<AtomicBool>,
    json_mode: bool,
) -> eyre::Result<RunSummary> {
    tracing::info!(input = %input.display(), "replaying telemetry log");
    execute(cfg, ReplaySource::from_path(input), opts, shutdown, json_mode)
}

/// Estimate a pulsed nominal plant in memory for at least three commit periods
/// and check that a value inside the clamp range gets committed.
pub fn self_check(cfg: &Config, json_mode: bool) -> eyre::Result<()> {
    let sim = SimSettings {
        seconds: (cfg.commit.period_s * 3.0).max(60.0),
        current: 2.0,
        pulse: Some(10.0),
        pulse_period: 4.0,
        duty: 0.5,
        r_series: None,
        noise: 0.0,
        seed: 1,
    };
    let source = simulated_source(cfg, &sim)?;
    let mut estimator = estimator_for(cfg, FileParamStore::in_memory())?;
    estimator.set_enabled(true);
    let params = RunParams {
        mode: SamplingMode::Direct,
        timeout: Duration::from_millis(cfg.source.timeout_ms),
        ..RunParams::default()
    };
    let mut sink = NullSink;
    let summary = rinest_core::runner::run(source, &mut estimator, &mut sink, &params)?;

    let Some(committed) = summary.committed else {
        eyre::bail!("self-check failed: no internal resistance was committed");
    };
    if !summary.params.iter().all(|p| p.is_finite()) {
        eyre::bail!("self-check failed: parameter vector diverged");
    }
    let c = &cfg.commit;
    if !(c.clamp_min_ohm..=c.clamp_max_ohm).contains(&committed) {
        eyre::bail!("self-check failed: committed value {committed} outside clamp range");
    }

    let commits = summary.stats.commits;
    if json_mode {
        let line = json!({ "self_check": "ok", "committed_ohm": committed, "commits": commits });
        println!("{line}");
    } else {
        println!("self-check ok: committed R = {committed:.3} ohm after {commits} commits");
    }
    Ok(())
}

fn report(summary: &RunSummary, diagnostics_written: Option<u64>, json_mode: bool) {
    if json_mode {
        let line = json!({
            "stop": format!("{:?}", summary.stop),
            "committed_ohm": summary.committed,
            "best_r_internal_ohm": summary.best_r_internal,
            "r_steady_state_ohm": summary.physical.r_steady_state,
            "r_transient_ohm": summary.physical.r_transient,
            "voltage_open_circuit_v": summary.physical.voltage_open_circuit,
            "params": summary.params,
            "received": summary.stats.received,
            "processed": summary.stats.processed,
            "commits": summary.stats.commits,
            "store_errors": summary.stats.store_errors,
            "diagnostics_written": diagnostics_written,
        });
        println!("{line}");
        return;
    }

    match summary.committed {
        Some(r) => println!("estimation complete ({:?}): committed R = {r:.3} ohm", summary.stop),
        None => println!("estimation complete ({:?}): nothing committed", summary.stop),
    }
    println!(
        "model: r_ss = {:.4} ohm, r_t = {:.4} ohm, v_oc = {:.3} V",
        summary.physical.r_steady_state,
        summary.physical.r_transient,
        summary.physical.voltage_open_circuit
    );
}

fn print_stats(summary: &RunSummary) {
    let s = &summary.stats;
    eprintln!("\n--- Estimator Stats ---");
    eprintln!(
        "Samples received/processed/skipped: {} / {} / {}",
        s.received, s.processed, s.skipped
    );
    eprintln!("Screened from tracking: {}", s.screened);
    eprintln!("Commits: {} (store errors: {})", s.commits, s.store_errors);
    eprintln!("Parameters: {:?}", summary.params);
    eprintln!("-----------------------\n");
}
