mod common;

use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use serde_json::json;

use atomprep::error::PrepError;
use atomprep::export::{ExportOptions, export_samples};
use atomprep::poscar::read_poscar;
use atomprep::record::{DatasetRecord, parse_records};

use common::record;

fn options(dir: &std::path::Path, max_samples: usize) -> ExportOptions {
    ExportOptions {
        property: "optb88vdw_bandgap".to_string(),
        max_samples,
        output_dir: Utf8PathBuf::from_path_buf(dir.join("out")).unwrap(),
        id_prop_file: "id_prop.csv".to_string(),
    }
}

fn records(values: Vec<serde_json::Value>) -> Vec<DatasetRecord> {
    let entries: Vec<_> = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| record(&format!("JVASP-{}", i + 1), value))
        .collect();
    parse_records(&serde_json::to_string(&entries).unwrap()).unwrap()
}

#[test]
fn writes_one_line_per_available_value_and_skips_sentinel() {
    let temp = tempfile::tempdir().unwrap();
    let options = options(temp.path(), 50);
    let records = records(vec![json!(1.5), json!("na"), json!(0.0123456789), json!(-0.25)]);

    let summary = export_samples(&records, &options).unwrap();

    assert_eq!(summary.samples.len(), 3);
    assert_eq!(summary.skipped_missing, 1);
    let content = fs::read_to_string(options.id_prop_path().as_std_path()).unwrap();
    assert_eq!(
        content,
        "POSCAR-JVASP-1.vasp,1.500000\n\
         POSCAR-JVASP-3.vasp,0.012346\n\
         POSCAR-JVASP-4.vasp,-0.250000\n"
    );
    assert!(!options.output_dir.join("POSCAR-JVASP-2.vasp").exists());
}

#[test]
fn every_value_has_six_decimals() {
    let temp = tempfile::tempdir().unwrap();
    let options = options(temp.path(), 0);
    let records = records(vec![json!(3), json!(1e-9), json!(12345.678)]);

    export_samples(&records, &options).unwrap();

    let content = fs::read_to_string(options.id_prop_path().as_std_path()).unwrap();
    for line in content.lines() {
        let (_, value) = line.split_once(',').unwrap();
        let (_, decimals) = value.split_once('.').unwrap();
        assert_eq!(decimals.len(), 6, "line {line}");
    }
}

#[test]
fn stops_at_max_samples() {
    let temp = tempfile::tempdir().unwrap();
    let options = options(temp.path(), 2);
    let records = records(vec![json!("na"), json!(1.0), json!(2.0), json!(3.0)]);

    let summary = export_samples(&records, &options).unwrap();

    assert_eq!(summary.samples.len(), 2);
    let content = fs::read_to_string(options.id_prop_path().as_std_path()).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(!options.output_dir.join("POSCAR-JVASP-4.vasp").exists());
}

#[test]
fn zero_cap_exports_everything() {
    let temp = tempfile::tempdir().unwrap();
    let options = options(temp.path(), 0);
    let values = (0..60).map(|i| json!(i as f64 / 10.0)).collect();

    let summary = export_samples(&records(values), &options).unwrap();
    assert_eq!(summary.samples.len(), 60);
}

#[test]
fn exported_poscar_reads_back() {
    let temp = tempfile::tempdir().unwrap();
    let options = options(temp.path(), 1);
    let records = records(vec![json!(0.731)]);

    export_samples(&records, &options).unwrap();

    let structure =
        read_poscar(options.output_dir.join("POSCAR-JVASP-1.vasp").as_std_path()).unwrap();
    assert_eq!(structure.comment, "JVASP-1");
    assert_eq!(structure.composition(), vec![("Si".to_string(), 2)]);
}

#[test]
fn non_numeric_property_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let options = options(temp.path(), 50);
    let records = records(vec![json!(1.0), json!(null)]);

    assert_matches!(
        export_samples(&records, &options),
        Err(PrepError::InvalidPropertyValue { .. })
    );
}

#[test]
fn absent_property_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let mut options = options(temp.path(), 50);
    options.property = "mbj_bandgap".to_string();
    let records = records(vec![json!(1.0)]);

    assert_matches!(
        export_samples(&records, &options),
        Err(PrepError::MissingProperty { .. })
    );
}
