use rinest_core::mocks::MemoryStore;
use rinest_core::{AdaptationCfg, BuildError, CommitCfg, Estimator, ModelCfg, StepOutcome};
use rinest_traits::Sample;
use rstest::rstest;

#[rstest]
fn builder_missing_store_yields_typed_build_error() {
    let err = Estimator::builder()
        .with_model(ModelCfg::default())
        .try_build()
        .expect_err("should fail with MissingStore");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingStore) => {}
        other => panic!("expected MissingStore, got: {other:?}"),
    }
}

#[rstest]
#[case::negative_series_resistance(
    ModelCfg { r_series_ohm: -0.1, ..ModelCfg::default() },
    AdaptationCfg::default(),
    CommitCfg::default()
)]
#[case::zero_rc_resistance(
    ModelCfg { r_transient_ohm: 0.0, ..ModelCfg::default() },
    AdaptationCfg::default(),
    CommitCfg::default()
)]
#[case::nan_capacitance(
    ModelCfg { c_transient_f: f64::NAN, ..ModelCfg::default() },
    AdaptationCfg::default(),
    CommitCfg::default()
)]
#[case::negative_gain(
    ModelCfg::default(),
    AdaptationCfg { gains: [1e-4, -1e-4, 1e-4, 1e-4], ..AdaptationCfg::default() },
    CommitCfg::default()
)]
#[case::infinite_leakage(
    ModelCfg::default(),
    AdaptationCfg { leakage: f64::INFINITY, ..AdaptationCfg::default() },
    CommitCfg::default()
)]
#[case::zero_period(
    ModelCfg::default(),
    AdaptationCfg::default(),
    CommitCfg { period_s: 0.0, ..CommitCfg::default() }
)]
#[case::zero_resolution(
    ModelCfg::default(),
    AdaptationCfg::default(),
    CommitCfg { resolution_ohm: 0.0, ..CommitCfg::default() }
)]
#[case::inverted_clamp(
    ModelCfg::default(),
    AdaptationCfg::default(),
    CommitCfg { clamp_min_ohm: 0.3, clamp_max_ohm: 0.2, ..CommitCfg::default() }
)]
#[case::blank_key(
    ModelCfg::default(),
    AdaptationCfg::default(),
    CommitCfg { param_key: "  ".into(), ..CommitCfg::default() }
)]
fn invalid_config_is_rejected(
    #[case] model: ModelCfg,
    #[case] adaptation: AdaptationCfg,
    #[case] commit: CommitCfg,
) {
    let err = Estimator::builder()
        .with_store(MemoryStore::default())
        .with_model(model)
        .with_adaptation(adaptation)
        .with_commit(commit)
        .build()
        .expect_err("invalid config must not build");
    assert!(
        matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        ),
        "got: {err:?}"
    );
}

#[test]
fn wide_clamp_variant_builds() {
    let est = Estimator::builder()
        .with_store(MemoryStore::default())
        .with_commit(CommitCfg {
            resolution_ohm: 0.1,
            clamp_min_ohm: -1.0,
            clamp_max_ohm: 0.2,
            ..CommitCfg::default()
        })
        .build();
    assert!(est.is_ok());
}

#[test]
fn disabled_flag_is_honoured_by_builder() {
    let mut est = Estimator::builder()
        .with_store(MemoryStore::default())
        .with_enabled(false)
        .build()
        .unwrap();
    assert_eq!(
        est.step(&Sample::new(0, 1.0, 22.0)).unwrap(),
        StepOutcome::Disabled
    );
}
