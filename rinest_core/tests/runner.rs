use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use rinest_core::mocks::{CollectingSink, MemoryStore, VecSource};
use rinest_core::runner::run;
use rinest_core::{
    AdaptationCfg, CommitCfg, EstimatorError, ModelCfg, NullSink, RunParams, SamplingMode,
    StopReason, build_estimator,
};
use rinest_telemetry::{CurrentProfile, SimulatedBattery, TheveninPlant};
use rinest_traits::{ParamStore, Sample};
use rstest::rstest;

fn estimator(commit: CommitCfg) -> rinest_core::EstimatorG<MemoryStore> {
    build_estimator(
        MemoryStore::default(),
        ModelCfg::default(),
        AdaptationCfg::default(),
        commit,
    )
    .unwrap()
}

fn params(mode: SamplingMode) -> RunParams {
    RunParams {
        mode,
        timeout: Duration::from_millis(200),
        ..RunParams::default()
    }
}

#[rstest]
#[case::direct(SamplingMode::Direct)]
#[case::event(SamplingMode::Event)]
#[case::paced(SamplingMode::Paced(2000))]
fn every_mode_processes_the_whole_stream(#[case] mode: SamplingMode) {
    let samples: Vec<Sample> = (0..50)
        .map(|k| Sample::new(1_000_000 + k * 20_000, -5.0, 22.0))
        .collect();
    let mut est = estimator(CommitCfg::default());
    let mut sink = CollectingSink::default();

    let summary = run(VecSource::new(samples), &mut est, &mut sink, &params(mode)).unwrap();

    assert_eq!(summary.stop, StopReason::EndOfStream);
    assert_eq!(summary.stats.received, 50);
    assert_eq!(summary.stats.processed, 49);
    // First sample is warm-up and publishes nothing.
    assert_eq!(sink.records.len(), 49);
    assert_eq!(sink.records[0].timestamp_us, 1_020_000);
}

#[test]
fn duplicate_timestamp_publishes_no_diagnostics() {
    let samples = vec![
        Sample::new(0, -5.0, 22.0),
        Sample::new(20_000, -5.0, 22.0),
        Sample::new(20_000, -5.0, 22.0),
        Sample::new(40_000, -5.0, 22.0),
    ];
    let mut est = estimator(CommitCfg::default());
    let mut sink = CollectingSink::default();
    let summary = run(
        VecSource::new(samples),
        &mut est,
        &mut sink,
        &params(SamplingMode::Direct),
    )
    .unwrap();
    assert_eq!(summary.stats.skipped, 1);
    let ts: Vec<u64> = sink.records.iter().map(|d| d.timestamp_us).collect();
    assert_eq!(ts, vec![20_000, 40_000]);
}

#[test]
fn subscription_failure_is_fatal() {
    let mut est = estimator(CommitCfg::default());
    let err = run(
        VecSource::refusing_subscription(),
        &mut est,
        &mut NullSink,
        &params(SamplingMode::Direct),
    )
    .expect_err("must not start");
    assert!(matches!(
        err.downcast_ref::<EstimatorError>(),
        Some(EstimatorError::Subscription(_))
    ));
    assert_eq!(est.stats().received, 0);
}

#[test]
fn store_failures_do_not_stop_the_run() {
    let mut est = build_estimator(
        MemoryStore::failing(),
        ModelCfg::default(),
        AdaptationCfg::default(),
        CommitCfg {
            period_s: 0.1,
            ..CommitCfg::default()
        },
    )
    .unwrap();
    let samples: Vec<Sample> = (0..60).map(|k| Sample::new(k * 20_000, -5.0, 22.0)).collect();
    let mut sink = CollectingSink::default();
    let summary = run(
        VecSource::new(samples),
        &mut est,
        &mut sink,
        &params(SamplingMode::Direct),
    )
    .unwrap();
    assert_eq!(summary.stop, StopReason::EndOfStream);
    assert!(summary.stats.store_errors >= 5);
    assert_eq!(summary.committed, None);
    assert_eq!(sink.records.len(), 59);
}

#[test]
fn sample_cap_and_shutdown_stop_cleanly() {
    let sim = SimulatedBattery::new(TheveninPlant::default(), CurrentProfile::Constant(5.0), 50)
        .unwrap();
    let mut est = estimator(CommitCfg::default());
    let capped = RunParams {
        max_samples: Some(25),
        ..params(SamplingMode::Event)
    };
    let summary = run(sim, &mut est, &mut NullSink, &capped).unwrap();
    assert_eq!(summary.stop, StopReason::SampleCap);
    assert_eq!(summary.stats.received, 25);

    let sim = SimulatedBattery::new(TheveninPlant::default(), CurrentProfile::Constant(5.0), 50)
        .unwrap();
    let mut est = estimator(CommitCfg::default());
    let stopped = RunParams {
        shutdown: Some(Arc::new(AtomicBool::new(true))),
        ..params(SamplingMode::Direct)
    };
    let summary = run(sim, &mut est, &mut NullSink, &stopped).unwrap();
    assert_eq!(summary.stop, StopReason::Shutdown);
    assert_eq!(summary.stats.received, 0);
}

#[test]
fn pulsed_load_on_true_plant_commits_a_plausible_resistance() {
    // Plant matches the nominal model; the pulse keeps the current excited.
    let sim = SimulatedBattery::new(
        TheveninPlant::default(),
        CurrentProfile::Pulse {
            base_a: 2.0,
            pulse_a: 10.0,
            period_s: 4.0,
            duty: 0.5,
        },
        50,
    )
    .unwrap()
    .with_samples(50 * 60);
    let mut est = estimator(CommitCfg::default());
    let summary = run(sim, &mut est, &mut NullSink, &params(SamplingMode::Direct)).unwrap();

    assert_eq!(summary.stats.commits, 5);
    let committed = summary.committed.expect("at least one commit");
    assert!((0.01..=0.2).contains(&committed), "committed {committed}");
    assert_eq!(est.store().get("BAT1_R_INTERNAL"), Some(committed));
    assert!(summary.params.iter().all(|p| p.is_finite()));

    let voc = summary.physical.voltage_open_circuit;
    let v_oc = TheveninPlant::default().v_open_circuit_v;
    assert!((voc - v_oc).abs() < 0.05, "voc {voc} vs plant {v_oc}");
}
