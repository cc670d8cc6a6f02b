use std::fs;
use std::time::Duration;

use rinest_telemetry::{FileParamStore, ReplaySource, TelemetryError};
use rinest_traits::{ParamStore, Sample, TelemetrySource};
use rstest::rstest;

const TIMEOUT: Duration = Duration::from_millis(10);

#[test]
fn replays_rows_in_file_order_then_ends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(
        &path,
        "timestamp_us,current_a,voltage_v\n1000,5.0,21.5\n21000,5.5,21.45\n21000,5.5,21.45\n",
    )
    .unwrap();

    let mut src = ReplaySource::from_path(&path);
    assert_eq!(src.remaining(), None);
    src.subscribe().unwrap();
    assert_eq!(src.remaining(), Some(3));

    let mut got = Vec::new();
    while let Some(s) = src.next_sample(TIMEOUT).unwrap() {
        got.push(s);
    }
    assert_eq!(
        got,
        vec![
            Sample::new(1000, 5.0, 21.5),
            Sample::new(21000, 5.5, 21.45),
            Sample::new(21000, 5.5, 21.45),
        ]
    );
}

#[test]
fn missing_log_fails_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let mut src = ReplaySource::from_path(dir.path().join("absent.csv"));
    let err = src.subscribe().expect_err("missing log");
    assert!(matches!(
        err.downcast_ref::<TelemetryError>(),
        Some(TelemetryError::Unavailable(_))
    ));
}

#[rstest]
#[case::wrong_headers("time,i,v\n1,2,3\n")]
#[case::bad_number("timestamp_us,current_a,voltage_v\n1000,abc,21.0\n")]
fn malformed_log_is_corrupt(#[case] body: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, body).unwrap();
    let err = ReplaySource::from_path(&path)
        .subscribe()
        .expect_err("malformed log");
    assert!(matches!(
        err.downcast_ref::<TelemetryError>(),
        Some(TelemetryError::Corrupt(_))
    ));
}

#[test]
fn read_before_subscribe_is_an_error() {
    let mut src = ReplaySource::from_path("whatever.csv");
    assert!(src.next_sample(TIMEOUT).is_err());
}

#[test]
fn file_store_persists_only_on_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("params.toml");

    let mut store = FileParamStore::open(&path).unwrap();
    assert_eq!(store.get("BAT1_R_INTERNAL"), None);
    store.commit().unwrap();
    assert!(!path.exists(), "clean commit must not write");

    store.set("BAT1_R_INTERNAL", 0.07).unwrap();
    assert!(!path.exists());
    store.commit().unwrap();
    assert!(path.exists());

    let reopened = FileParamStore::open(&path).unwrap();
    assert_eq!(reopened.get("BAT1_R_INTERNAL"), Some(0.07));
    assert_eq!(reopened.path(), Some(path.as_path()));
}

#[test]
fn file_store_rejects_non_finite_values() {
    let mut store = FileParamStore::in_memory();
    assert!(store.set("BAT1_R_INTERNAL", f64::NAN).is_err());
    store.set("BAT1_R_INTERNAL", 0.02).unwrap();
    store.commit().unwrap();
    assert_eq!(store.get("BAT1_R_INTERNAL"), Some(0.02));
    assert_eq!(store.path(), None);
}

#[test]
fn corrupt_parameter_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("params.toml");
    fs::write(&path, "[params\nBAT1_R_INTERNAL = ").unwrap();
    let err = FileParamStore::open(&path).expect_err("corrupt file");
    assert!(matches!(err, TelemetryError::Store(_)));
}
