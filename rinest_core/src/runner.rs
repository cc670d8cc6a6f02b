use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use eyre::WrapErr;
use rinest_traits::clock::MonotonicClock;
use rinest_traits::{ParamStore, Sample, TelemetrySource};

use crate::core::{EstimatorCore, EstimatorStats};
use crate::error::{EstimatorError, Result};
use crate::sampler::{Sampler, SamplerExit};
use crate::sink::DiagnosticSink;
use crate::source_error::map_source_error;
use crate::types::PhysicalParams;

/// How telemetry should be pulled from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Read inside the estimator loop via `TelemetrySource::next_sample`.
    Direct,
    /// Background thread forwarding samples as they arrive.
    Event,
    /// Background thread reading at the given rate.
    Paced(u32),
}

#[derive(Debug, Clone)]
pub struct RunParams {
    pub mode: SamplingMode,
    /// Per-read timeout.
    pub timeout: Duration,
    /// Stop after this many received samples.
    pub max_samples: Option<u64>,
    /// Consecutive read timeouts tolerated before the run fails with `Timeout`.
    pub max_consecutive_timeouts: u32,
    /// Set to request a clean stop between samples.
    pub shutdown: Option<Arc<AtomicBool>>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Direct,
            timeout: Duration::from_millis(100),
            max_samples: None,
            max_consecutive_timeouts: 50,
            shutdown: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    SampleCap,
    Shutdown,
}

/// Where the estimator stood when the run ended.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub stop: StopReason,
    pub stats: EstimatorStats,
    pub params: [f64; 4],
    pub physical: PhysicalParams,
    pub best_r_internal: Option<f64>,
    pub committed: Option<f64>,
}

/// Subscribe, then drive one `step` per received sample until the stream
/// ends, the sample cap is hit or shutdown is requested.
///
/// Diagnostics are published for processed samples only. Store failures are
/// logged and the run continues; source failures other than timeouts end it.
pub fn run<S, P>(
    mut source: S,
    estimator: &mut EstimatorCore<P>,
    sink: &mut dyn DiagnosticSink,
    params: &RunParams,
) -> Result<RunSummary>
where
    S: TelemetrySource + Send + 'static,
    P: ParamStore,
{
    source
        .subscribe()
        .map_err(|e| eyre::Report::new(EstimatorError::Subscription(e.to_string())))
        .wrap_err("subscribing to battery telemetry")?;
    tracing::info!(mode = ?params.mode, enabled = estimator.is_enabled(), "estimator start");

    let stop = match params.mode {
        SamplingMode::Direct => run_direct(source, estimator, sink, params)?,
        SamplingMode::Event => {
            let mut sampler = Sampler::spawn_event(source, params.timeout, MonotonicClock::new());
            run_with_sampler(&mut sampler, params.timeout, estimator, sink, params)?
        }
        SamplingMode::Paced(hz) => {
            let mut sampler = Sampler::spawn(source, hz, params.timeout, MonotonicClock::new());
            let period = Duration::from_micros(crate::util::period_us(hz));
            let wait = params.timeout.max(period.saturating_mul(2));
            run_with_sampler(&mut sampler, wait, estimator, sink, params)?
        }
    };

    let summary = RunSummary {
        stop,
        stats: *estimator.stats(),
        params: *estimator.parameters().as_array(),
        physical: estimator.physical(),
        best_r_internal: estimator.best_estimate().map(|b| b.resistance),
        committed: estimator.committed_resistance(),
    };
    tracing::info!(
        stop = ?summary.stop,
        received = summary.stats.received,
        processed = summary.stats.processed,
        skipped = summary.stats.skipped,
        commits = summary.stats.commits,
        committed = ?summary.committed,
        "estimator stopped"
    );
    Ok(summary)
}

fn shutdown_requested(params: &RunParams) -> bool {
    params
        .shutdown
        .as_ref()
        .is_some_and(|f| f.load(Ordering::Relaxed))
}

fn cap_reached(received: u64, params: &RunParams) -> bool {
    params.max_samples.is_some_and(|cap| received >= cap)
}

/// Step one sample and publish its diagnostics. Store errors are local to the sample.
fn feed<P: ParamStore>(
    estimator: &mut EstimatorCore<P>,
    sink: &mut dyn DiagnosticSink,
    sample: &Sample,
) -> Result<()> {
    match estimator.step(sample) {
        Ok(outcome) => {
            if outcome.is_processed()
                && let Some(d) = estimator.read_diagnostics()
            {
                sink.publish(d);
            }
            Ok(())
        }
        Err(e) => match e.downcast_ref::<EstimatorError>() {
            Some(EstimatorError::Store(_)) => {
                tracing::warn!(error = %format!("{e:#}"), "commit failed; continuing");
                if let Some(d) = estimator.read_diagnostics() {
                    sink.publish(d);
                }
                Ok(())
            }
            _ => Err(e),
        },
    }
}

fn on_timeout(consecutive: &mut u32, params: &RunParams) -> Result<()> {
    *consecutive += 1;
    if *consecutive > params.max_consecutive_timeouts {
        tracing::error!(consecutive = *consecutive, "telemetry stalled");
        return Err(eyre::Report::new(EstimatorError::Timeout));
    }
    Ok(())
}

fn run_direct<S, P>(
    mut source: S,
    estimator: &mut EstimatorCore<P>,
    sink: &mut dyn DiagnosticSink,
    params: &RunParams,
) -> Result<StopReason>
where
    S: TelemetrySource,
    P: ParamStore,
{
    let mut received = 0_u64;
    let mut consecutive_timeouts = 0_u32;
    loop {
        if shutdown_requested(params) {
            return Ok(StopReason::Shutdown);
        }
        if cap_reached(received, params) {
            return Ok(StopReason::SampleCap);
        }
        match source.next_sample(params.timeout) {
            Ok(Some(sample)) => {
                received += 1;
                consecutive_timeouts = 0;
                feed(estimator, sink, &sample)?;
            }
            Ok(None) => return Ok(StopReason::EndOfStream),
            Err(e) => match map_source_error(&*e) {
                EstimatorError::Timeout => on_timeout(&mut consecutive_timeouts, params)?,
                other => {
                    return Err(eyre::Report::new(other).wrap_err("reading battery telemetry"));
                }
            },
        }
    }
}

fn run_with_sampler<P: ParamStore>(
    sampler: &mut Sampler,
    wait: Duration,
    estimator: &mut EstimatorCore<P>,
    sink: &mut dyn DiagnosticSink,
    params: &RunParams,
) -> Result<StopReason> {
    let mut received = 0_u64;
    let mut consecutive_timeouts = 0_u32;
    loop {
        if shutdown_requested(params) {
            return Ok(StopReason::Shutdown);
        }
        if cap_reached(received, params) {
            return Ok(StopReason::SampleCap);
        }
        match sampler.recv_timeout(wait) {
            Ok(sample) => {
                received += 1;
                consecutive_timeouts = 0;
                feed(estimator, sink, &sample)?;
            }
            Err(RecvTimeoutError::Timeout) => on_timeout(&mut consecutive_timeouts, params)?,
            Err(RecvTimeoutError::Disconnected) => {
                // Anything queued before the thread exited was already received.
                return match sampler.exit_status() {
                    Some(SamplerExit::Failed(msg)) => Err(eyre::Report::new(
                        EstimatorError::Source(msg),
                    )
                    .wrap_err("reading battery telemetry")),
                    _ => Ok(StopReason::EndOfStream),
                };
            }
        }
    }
}
