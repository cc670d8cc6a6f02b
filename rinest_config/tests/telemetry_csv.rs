use rinest_config::{
    PersistedParams, TelemetryRow, load_params_file, load_telemetry_csv, save_params_file,
};
use std::fs;
use std::io::Write;
use tempfile::tempdir;

#[test]
fn loads_rows_in_file_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let mut f = fs::File::create(&path).unwrap();
    writeln!(f, "timestamp_us,current_a,voltage_v").unwrap();
    writeln!(f, "1000000,5.0,21.4").unwrap();
    writeln!(f, "1020000, 5.5 ,21.35").unwrap();
    // Duplicate timestamps are kept; the estimator skips them.
    writeln!(f, "1020000,5.5,21.35").unwrap();

    let rows = load_telemetry_csv(&path).expect("load csv");
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[1],
        TelemetryRow {
            timestamp_us: 1_020_000,
            current_a: 5.5,
            voltage_v: 21.35
        }
    );
    assert_eq!(rows[2].timestamp_us, rows[1].timestamp_us);
}

#[test]
fn rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "t,i,v\n1,2,3\n").unwrap();
    let err = load_telemetry_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers"));
}

#[test]
fn reports_row_number_of_bad_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(
        &path,
        "timestamp_us,current_a,voltage_v\n1,2.0,22.0\n2,abc,22.0\n",
    )
    .unwrap();
    let err = load_telemetry_csv(&path).expect_err("bad row");
    assert!(format!("{err}").contains("row 3"), "got: {err}");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_telemetry_csv(&dir.path().join("nope.csv")).is_err());
}

#[test]
fn params_file_round_trips_and_missing_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("params.toml");

    let empty = load_params_file(&path).expect("missing file is empty");
    assert!(empty.params.is_empty());

    let mut p = PersistedParams::default();
    p.params.insert("BAT1_R_INTERNAL".into(), 0.05);
    save_params_file(&path, &p).expect("save");
    assert!(!path.with_extension("new").exists());

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[params]"));
    let back = load_params_file(&path).expect("load");
    assert_eq!(back.params.get("BAT1_R_INTERNAL"), Some(&0.05));
}

#[test]
fn corrupt_params_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("params.toml");
    fs::write(&path, "[params]\nBAT1_R_INTERNAL = \"oops\"\n").unwrap();
    let err = load_params_file(&path).expect_err("corrupt file");
    assert!(format!("{err}").contains("parse parameter file"));
}
