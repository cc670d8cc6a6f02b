//! `From` implementations bridging `rinest_config` types to `rinest_core` types.

use crate::config::{AdaptationCfg, CommitCfg, ModelCfg};
use crate::runner::SamplingMode;

impl From<&rinest_config::ModelCfg> for ModelCfg {
    fn from(c: &rinest_config::ModelCfg) -> Self {
        Self {
            r_series_ohm: c.r_series_ohm,
            r_transient_ohm: c.r_transient_ohm,
            c_transient_f: c.c_transient_f,
            v_open_circuit_v: c.v_open_circuit_v,
        }
    }
}

impl From<&rinest_config::AdaptationCfg> for AdaptationCfg {
    fn from(c: &rinest_config::AdaptationCfg) -> Self {
        Self {
            gains: c.gains,
            leakage: c.leakage,
            min_abs_current_a: c.min_abs_current_a,
        }
    }
}

impl From<&rinest_config::CommitCfg> for CommitCfg {
    fn from(c: &rinest_config::CommitCfg) -> Self {
        Self {
            period_s: c.period_s,
            resolution_ohm: c.resolution_ohm,
            clamp_min_ohm: c.clamp_min_ohm,
            clamp_max_ohm: c.clamp_max_ohm,
            param_key: c.param_key.clone(),
        }
    }
}

impl From<&rinest_config::SourceCfg> for SamplingMode {
    fn from(c: &rinest_config::SourceCfg) -> Self {
        match c.mode {
            rinest_config::RunMode::Direct => Self::Direct,
            rinest_config::RunMode::Event => Self::Event,
            rinest_config::RunMode::Paced => Self::Paced(c.sample_rate_hz),
        }
    }
}
