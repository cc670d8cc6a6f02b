#![no_main]
use libfuzzer_sys::arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rinest_core::mocks::MemoryStore;
use rinest_core::{AdaptationCfg, CommitCfg, ModelCfg, build_estimator};
use rinest_traits::{ParamStore, Sample};

#[derive(Debug, Arbitrary)]
struct Input {
    period_s: u8,
    samples: Vec<(u16, f64, f64)>,
}

// Arbitrary telemetry (NaN, duplicate timestamps, huge currents) must never
// panic, and anything that reaches the store stays within the clamp range.
fuzz_target!(|input: Input| {
    let commit = CommitCfg {
        period_s: f64::from(input.period_s.max(1)) / 10.0,
        ..CommitCfg::default()
    };
    let (lo, hi) = (commit.clamp_min_ohm, commit.clamp_max_ohm);
    let key = commit.param_key.clone();
    let Ok(mut est) = build_estimator(
        MemoryStore::default(),
        ModelCfg::default(),
        AdaptationCfg::default(),
        commit,
    ) else {
        return;
    };

    let mut t_us = 0u64;
    for (step_ms, current, voltage) in input.samples {
        t_us += u64::from(step_ms) * 1_000;
        let _ = est.step(&Sample::new(t_us, current, voltage));
        if let Some(v) = est.store().get(&key) {
            assert!((lo..=hi).contains(&v), "stored {v} outside [{lo}, {hi}]");
        }
    }
});
