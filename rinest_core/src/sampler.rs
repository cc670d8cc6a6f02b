//! Background telemetry sampling.
//!
//! Spawns a thread that owns the `TelemetrySource` and forwards samples over
//! a bounded channel. Every sample matters to the estimator, so the thread
//! blocks on a full channel instead of dropping readings. Event-driven and
//! clock-paced variants are provided.
//!
//! Each `Sampler` owns exactly one thread, joined when the `Sampler` is dropped.
//! The channel disconnects when the source ends or fails with a non-timeout error.
use crossbeam_channel as xch;
use rinest_traits::clock::Clock;
use rinest_traits::{Sample, TelemetrySource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::error::EstimatorError;
use crate::source_error::map_source_error;

/// Channel depth between the sampler thread and the estimator loop.
pub const CHANNEL_CAPACITY: usize = 64;

/// Why a sampler thread stopped forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerExit {
    EndOfStream,
    Shutdown,
    ConsumerGone,
    Failed(String),
}

pub struct Sampler {
    rx: xch::Receiver<Sample>,
    last_ok: Arc<AtomicU64>,
    clock: Arc<dyn Clock + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<SamplerExit>>,
}

/// One read attempt; `Some(exit)` ends the thread.
fn pump<S: TelemetrySource, C: Clock>(
    source: &mut S,
    tx: &xch::Sender<Sample>,
    timeout: Duration,
    clock: &C,
    last_ok: &AtomicU64,
) -> Option<SamplerExit> {
    match source.next_sample(timeout) {
        Ok(Some(sample)) => {
            if tx.send(sample).is_err() {
                tracing::debug!("sampler consumer disconnected, exiting thread");
                return Some(SamplerExit::ConsumerGone);
            }
            last_ok.store(clock.now_us(), Ordering::Relaxed);
            None
        }
        Ok(None) => {
            tracing::debug!("telemetry stream ended");
            Some(SamplerExit::EndOfStream)
        }
        Err(e) => match map_source_error(&*e) {
            EstimatorError::Timeout => {
                tracing::trace!("telemetry read timed out");
                None
            }
            other => {
                tracing::warn!(error = %other, "telemetry source failed; sampler stopping");
                Some(SamplerExit::Failed(other.to_string()))
            }
        },
    }
}

impl Sampler {
    /// Rate-paced sampler: one read per `1/hz`, sleeping on `clock` between reads.
    pub fn spawn<S, C>(mut source: S, hz: u32, timeout: Duration, clock: C) -> Self
    where
        S: TelemetrySource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let clock = Arc::new(clock);
        let thread_clock = Arc::clone(&clock);
        let last_ok = Arc::new(AtomicU64::new(clock.now_us()));
        let last_ok_clone = last_ok.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));

        let join_handle = std::thread::spawn(move || {
            let exit = loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break SamplerExit::Shutdown;
                }
                if let Some(exit) =
                    pump(&mut source, &tx, timeout, &*thread_clock, &last_ok_clone)
                {
                    break exit;
                }
                if shutdown_clone.load(Ordering::Relaxed) {
                    break SamplerExit::Shutdown;
                }
                thread_clock.sleep(period);
            };
            tracing::trace!(?exit, "sampler thread exiting");
            exit
        });

        Self {
            rx,
            last_ok,
            clock,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Event-driven sampler: no extra sleeps, `next_sample` blocks until data arrives.
    pub fn spawn_event<S, C>(mut source: S, timeout: Duration, clock: C) -> Self
    where
        S: TelemetrySource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let clock = Arc::new(clock);
        let thread_clock = Arc::clone(&clock);
        let last_ok = Arc::new(AtomicU64::new(clock.now_us()));
        let last_ok_clone = last_ok.clone();

        let join_handle = std::thread::spawn(move || {
            let exit = loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler event thread received shutdown signal");
                    break SamplerExit::Shutdown;
                }
                if let Some(exit) =
                    pump(&mut source, &tx, timeout, &*thread_clock, &last_ok_clone)
                {
                    break exit;
                }
            };
            tracing::trace!(?exit, "sampler event thread exiting");
            exit
        });

        Self {
            rx,
            last_ok,
            clock,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Wait up to `timeout` for the next sample.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Sample, xch::RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Microseconds between the last forwarded sample (or the spawn, if
    /// none yet) and `now_us`, both read from the sampler's clock.
    pub fn stalled_for(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// `stalled_for` at the clock's current reading.
    pub fn stalled_for_now(&self) -> u64 {
        self.stalled_for(self.clock.now_us())
    }

    /// Stop the thread (if still running) and report why it exited.
    /// Returns `None` once the exit has already been collected.
    pub fn exit_status(&mut self) -> Option<SamplerExit> {
        self.stop()
    }

    fn stop(&mut self) -> Option<SamplerExit> {
        self.shutdown.store(true, Ordering::Relaxed);
        // Unblock a sender waiting on a full channel.
        while self.rx.try_recv().is_ok() {}
        let handle = self.join_handle.take()?;
        // Keep draining until the thread has observed the flag.
        while !handle.is_finished() {
            while self.rx.try_recv().is_ok() {}
            std::thread::yield_now();
        }
        match handle.join() {
            Ok(exit) => Some(exit),
            Err(e) => {
                tracing::warn!(?e, "sampler thread panicked during shutdown");
                None
            }
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        // The thread exits between reads or after the in-flight read returns
        // (bounded by the source timeout).
        let _ = self.stop();
    }
}
