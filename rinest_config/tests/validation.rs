use rinest_config::{RunMode, load_toml};
use rstest::rstest;

#[test]
fn empty_config_uses_nominal_defaults() {
    let cfg = load_toml("").expect("parse empty TOML");
    cfg.validate().expect("defaults must validate");
    assert!(cfg.estimator.enabled);
    assert_eq!(cfg.model.r_series_ohm, 0.1);
    assert_eq!(cfg.model.c_transient_f, 500.0);
    assert_eq!(cfg.adaptation.gains, [1e-4; 4]);
    assert_eq!(cfg.adaptation.leakage, 0.8);
    assert_eq!(cfg.commit.clamp_min_ohm, 0.01);
    assert_eq!(cfg.commit.clamp_max_ohm, 0.2);
    assert_eq!(cfg.commit.param_key, "BAT1_R_INTERNAL");
    assert_eq!(cfg.source.mode, RunMode::Event);
}

#[test]
fn accepts_alternate_clamp_and_resolution() {
    let toml = r#"
[commit]
period_s = 30.0
resolution_ohm = 0.1
clamp_min_ohm = -1.0
clamp_max_ohm = 0.2

[source]
sample_ms = 20
mode = "paced"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.commit.resolution_ohm, 0.1);
    assert_eq!(cfg.commit.clamp_min_ohm, -1.0);
    assert_eq!(cfg.source.timeout_ms, 20);
    assert_eq!(cfg.source.mode, RunMode::Paced);
}

#[rstest]
#[case("[commit]\nperiod_s = 0.0", "commit.period_s must be > 0")]
#[case("[commit]\nresolution_ohm = 0.0", "commit.resolution_ohm must be > 0")]
#[case(
    "[commit]\nclamp_min_ohm = 0.3\nclamp_max_ohm = 0.2",
    "clamp_min_ohm must be <="
)]
#[case("[commit]\nparam_key = \"  \"", "param_key must not be empty")]
#[case("[adaptation]\ngains = [1e-4, -1e-4, 1e-4, 1e-4]", "adaptation.gains[1]")]
#[case("[adaptation]\nleakage = -0.1", "adaptation.leakage")]
#[case("[model]\nc_transient_f = 0.0", "model.c_transient_f must be > 0")]
#[case("[model]\nr_transient_ohm = -0.05", "model.r_transient_ohm must be > 0")]
#[case("[source]\nsample_rate_hz = 0", "source.sample_rate_hz must be > 0")]
#[case("[source]\ntimeout_ms = 0", "source.timeout_ms must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "error `{err}` does not mention `{needle}`"
    );
}

#[test]
fn rejects_unknown_run_mode() {
    assert!(load_toml("[source]\nmode = \"turbo\"").is_err());
}
