//! Loading panel tables from disk.

mod common;

use std::fs::File;
use std::io::Write;

use polars::prelude::*;

use ivxj_core::{load_panel, ColumnRef, ColumnRole, ColumnSpec, DataError, IvxjEstimator};

fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn default_columns_are_positional() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "panel.csv",
        "unit,period,ret,dp,noise\nb,2,0.5,1.5,9\na,1,0.1,1.1,9\nb,1,0.4,1.4,9\na,2,0.2,1.2,9\n",
    );
    let frame = load_panel(&path, &ColumnSpec::default()).unwrap();
    assert_eq!(frame.columns().dependent, "ret");
    assert_eq!(frame.panel().lengths().as_slice(), &[2, 2]);
    assert_eq!(frame.panel().y(), &[0.1, 0.2, 0.4, 0.5]);
    assert_eq!(frame.panel().x(), &[1.1, 1.2, 1.4, 1.5]);
}

#[test]
fn named_columns_in_any_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "panel.csv",
        "dp,ret,year,firm\n1.0,0.1,2001,x\n2.0,0.2,2000,x\n3.0,0.3,2000,y\n",
    );
    let spec = ColumnSpec::named("firm", "year", "ret", "dp");
    let frame = load_panel(&path, &spec).unwrap();
    assert_eq!(frame.unit_ids(), &["x".to_string(), "y".to_string()]);
    assert_eq!(frame.panel().lengths().as_slice(), &[2, 1]);
    assert_eq!(frame.panel().x(), &[2.0, 1.0, 3.0]);
}

#[test]
fn missing_named_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "panel.csv", "firm,year,ret,dp\na,1,0.1,1.0\n");
    let spec = ColumnSpec::default().with(ColumnRole::Independent, ColumnRef::Name("bm".into()));
    let err = load_panel(&path, &spec).unwrap_err();
    assert!(
        matches!(err, DataError::MissingColumn { role: ColumnRole::Independent, ref name } if name == "bm"),
        "{err}"
    );
}

#[test]
fn too_few_columns_for_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "panel.csv", "firm,year,ret\na,1,0.1\n");
    let err = load_panel(&path, &ColumnSpec::default()).unwrap_err();
    assert!(matches!(err, DataError::InvalidColumnSpec(_)), "{err}");
}

#[test]
fn duplicate_unit_period() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "panel.csv",
        "firm,year,ret,dp\na,2000,0.1,1.0\na,2001,0.2,1.1\na,2000,0.3,1.2\n",
    );
    let err = load_panel(&path, &ColumnSpec::default()).unwrap_err();
    assert!(matches!(err, DataError::DuplicateObservation { .. }), "{err}");
}

#[test]
fn empty_cell_is_a_null() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "panel.csv",
        "firm,year,ret,dp\na,2000,0.1,1.0\na,2001,,1.1\n",
    );
    let err = load_panel(&path, &ColumnSpec::default()).unwrap_err();
    assert!(
        matches!(err, DataError::NullValue { ref column, row: 1 } if column == "ret"),
        "{err}"
    );
}

#[test]
fn late_decimal_in_whole_number_column() {
    let dir = tempfile::tempdir().unwrap();
    let mut body = String::from("firm,year,ret,dp\n");
    for t in 0..150 {
        let dp = if t < 120 {
            format!("{t}")
        } else {
            format!("{t}.5")
        };
        body.push_str(&format!("a,{},0.{},{dp}\n", 1900 + t, t % 10));
    }
    let path = write_csv(&dir, "panel.csv", &body);
    let frame = load_panel(&path, &ColumnSpec::default()).unwrap();
    assert_eq!(frame.panel().x().len(), 150);
    assert_eq!(frame.panel().x()[10], 10.0);
    assert_eq!(frame.panel().x()[140], 140.5);
}

#[test]
fn parquet_input_matches_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = common::fixture("unbalanced_six_units.csv");
    let spec = ColumnSpec::named("firm", "year", "ret", "dp");
    let from_csv = load_panel(&csv_path, &spec).unwrap();

    let mut df = LazyCsvReader::new(&csv_path)
        .with_has_header(true)
        .finish()
        .unwrap()
        .collect()
        .unwrap();
    let parquet_path = dir.path().join("panel.parquet");
    let file = File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();

    let from_parquet = load_panel(&parquet_path, &spec).unwrap();
    assert_eq!(from_parquet.panel(), from_csv.panel());
    assert_eq!(from_parquet.unit_ids(), from_csv.unit_ids());

    let estimator = IvxjEstimator::new();
    assert_eq!(
        estimator.estimate(from_parquet.panel(), 0.9).unwrap(),
        estimator.estimate(from_csv.panel(), 0.9).unwrap()
    );
}

#[test]
fn unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "panel.txt", "firm,year,ret,dp\n");
    let err = load_panel(&path, &ColumnSpec::default()).unwrap_err();
    assert!(matches!(err, DataError::UnsupportedFormat(_)));
}
