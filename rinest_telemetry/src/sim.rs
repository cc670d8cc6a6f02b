//! Simulated battery: a first-order Thevenin plant sampled at a fixed rate.
//!
//! ```text
//! V     = v_oc - r_s * I - v_rc
//! v_rc' = -v_rc / (r_t * c_t) + I / c_t
//! ```
//!
//! The RC state is advanced with the exact zero-order-hold solution, so the
//! plant stays stable at any sample rate. Positive current discharges.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rinest_traits::{BoxError, Sample, TelemetrySource};

use crate::error::{Result, TelemetryError};

/// True circuit behind the simulated telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TheveninPlant {
    pub r_series_ohm: f64,
    pub r_transient_ohm: f64,
    pub c_transient_f: f64,
    pub v_open_circuit_v: f64,
}

impl Default for TheveninPlant {
    fn default() -> Self {
        Self {
            r_series_ohm: 0.1,
            r_transient_ohm: 0.05,
            c_transient_f: 500.0,
            v_open_circuit_v: 22.1,
        }
    }
}

impl TheveninPlant {
    pub fn tau_s(&self) -> f64 {
        self.r_transient_ohm * self.c_transient_f
    }

    /// Terminal voltage once the RC branch has settled under a constant current.
    pub fn steady_state_voltage(&self, current_a: f64) -> f64 {
        self.v_open_circuit_v - (self.r_series_ohm + self.r_transient_ohm) * current_a
    }

    fn validate(&self) -> Result<()> {
        if !(self.r_series_ohm.is_finite() && self.r_series_ohm >= 0.0) {
            return Err(TelemetryError::InvalidSetting("r_series_ohm must be finite and >= 0"));
        }
        if !(self.r_transient_ohm.is_finite() && self.r_transient_ohm > 0.0) {
            return Err(TelemetryError::InvalidSetting("r_transient_ohm must be > 0"));
        }
        if !(self.c_transient_f.is_finite() && self.c_transient_f > 0.0) {
            return Err(TelemetryError::InvalidSetting("c_transient_f must be > 0"));
        }
        if !self.v_open_circuit_v.is_finite() {
            return Err(TelemetryError::InvalidSetting("v_open_circuit_v must be finite"));
        }
        Ok(())
    }
}

/// Load current as a function of time since the first sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentProfile {
    Constant(f64),
    /// Square wave: `pulse_a` for the first `duty` fraction of every period, `base_a` otherwise.
    Pulse {
        base_a: f64,
        pulse_a: f64,
        period_s: f64,
        duty: f64,
    },
}

impl CurrentProfile {
    pub fn current_at(&self, t_s: f64) -> f64 {
        match *self {
            Self::Constant(i) => i,
            Self::Pulse {
                base_a,
                pulse_a,
                period_s,
                duty,
            } => {
                let phase = t_s.rem_euclid(period_s) / period_s;
                if phase < duty { pulse_a } else { base_a }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Self::Constant(i) if !i.is_finite() => {
                Err(TelemetryError::InvalidSetting("constant current must be finite"))
            }
            Self::Pulse {
                base_a,
                pulse_a,
                period_s,
                duty,
            } => {
                if !(base_a.is_finite() && pulse_a.is_finite()) {
                    return Err(TelemetryError::InvalidSetting("pulse currents must be finite"));
                }
                if !(period_s.is_finite() && period_s > 0.0) {
                    return Err(TelemetryError::InvalidSetting("pulse period must be > 0"));
                }
                if !(0.0..=1.0).contains(&duty) {
                    return Err(TelemetryError::InvalidSetting("pulse duty must be within [0, 1]"));
                }
                Ok(())
            }
            Self::Constant(_) => Ok(()),
        }
    }
}

pub struct SimulatedBattery {
    plant: TheveninPlant,
    profile: CurrentProfile,
    period_us: u64,
    start_us: u64,
    t_us: u64,
    v_rc: f64,
    remaining: Option<u64>,
    noise: Option<(StdRng, Normal<f64>)>,
}

impl core::fmt::Debug for SimulatedBattery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedBattery")
            .field("plant", &self.plant)
            .field("profile", &self.profile)
            .field("t_us", &self.t_us)
            .field("remaining", &self.remaining)
            .field("noisy", &self.noise.is_some())
            .finish()
    }
}

impl SimulatedBattery {
    /// Plant at rest, sampled at `hz`, streaming forever.
    pub fn new(plant: TheveninPlant, profile: CurrentProfile, hz: u32) -> Result<Self> {
        plant.validate()?;
        profile.validate()?;
        if hz == 0 {
            return Err(TelemetryError::InvalidSetting("sample rate must be > 0"));
        }
        Ok(Self {
            plant,
            profile,
            period_us: (1_000_000 / u64::from(hz)).max(1),
            start_us: 0,
            t_us: 0,
            v_rc: 0.0,
            remaining: None,
            noise: None,
        })
    }

    /// End the stream after `n` samples.
    pub fn with_samples(mut self, n: u64) -> Self {
        self.remaining = Some(n);
        self
    }

    /// Timestamp of the first sample.
    pub fn with_start_us(mut self, t_us: u64) -> Self {
        self.start_us = t_us;
        self.t_us = t_us;
        self
    }

    /// Additive Gaussian noise on the voltage reading. `std_v == 0` disables it.
    pub fn with_noise(mut self, std_v: f64, seed: u64) -> Result<Self> {
        if std_v == 0.0 {
            self.noise = None;
            return Ok(self);
        }
        let dist = Normal::new(0.0, std_v)
            .map_err(|_| TelemetryError::InvalidSetting("noise std must be finite and >= 0"))?;
        self.noise = Some((StdRng::seed_from_u64(seed), dist));
        Ok(self)
    }

    pub fn plant(&self) -> &TheveninPlant {
        &self.plant
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    fn emit(&mut self) -> Sample {
        let dt = self.period_us as f64 / 1e6;
        let t_s = (self.t_us - self.start_us) as f64 / 1e6;
        let current = self.profile.current_at(t_s);
        let clean = self.plant.v_open_circuit_v - self.plant.r_series_ohm * current - self.v_rc;
        let voltage = match &mut self.noise {
            Some((rng, dist)) => clean + dist.sample(rng),
            None => clean,
        };
        let sample = Sample::new(self.t_us, current, voltage);

        let decay = (-dt / self.plant.tau_s()).exp();
        self.v_rc = decay * self.v_rc + self.plant.r_transient_ohm * current * (1.0 - decay);
        self.t_us = self.t_us.saturating_add(self.period_us);
        sample
    }
}

impl TelemetrySource for SimulatedBattery {
    fn next_sample(
        &mut self,
        _timeout: std::time::Duration,
    ) -> std::result::Result<Option<Sample>, BoxError> {
        match self.remaining {
            Some(0) => return Ok(None),
            Some(ref mut n) => *n -= 1,
            None => {}
        }
        Ok(Some(self.emit()))
    }
}
