//! End-to-end tests of the `em-dataprep` binary

use assert_cmd::Command;
use npyz::WriterBuilder;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn cmd() -> Command {
    Command::cargo_bin("em-dataprep").unwrap()
}

fn write_npy(path: &Path, data: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut out = Vec::new();
    let mut writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(&[1, 2, 2])
        .writer(&mut out)
        .begin_nd()
        .unwrap();
    writer.extend(data.iter().copied()).unwrap();
    writer.finish().unwrap();
    std::fs::write(path, out).unwrap();
}

#[test]
fn test_geometry_fractional_overlap() {
    cmd()
        .args(["geometry", "--aff", "3", "--psd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Input: (1, 20, 256, 256)"))
        .stdout(predicate::str::contains("affinity       (3, 20, 256, 256)"))
        .stdout(predicate::str::contains("synapse        (1, 20, 256, 256)"))
        .stdout(predicate::str::contains("Stride: (0.5, 0.5, 0.5)"))
        .stdout(predicate::str::contains("Blend: bump"));
}

#[test]
fn test_geometry_voxel_overlap_json() {
    let output = cmd()
        .args([
            "geometry", "--aff", "12", "--overlap", "4", "4", "4", "--format", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["geometry"]["scan_params"]["stride"],
        serde_json::json!([16, 252, 252])
    );
    assert_eq!(
        json["geometry"]["scan_outputs"]["affinity"]["channels"],
        serde_json::json!(3)
    );
    assert!(json["experiment"].is_null());
}

#[test]
fn test_geometry_embedding_with_experiment() {
    cmd()
        .args(["geometry", "--vec", "16", "--vec2aff", "--mit", "--exp-name", "run1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("embedding      (16, 20, 256, 256)"))
        .stdout(predicate::str::contains("embedding      (3, 20, 256, 256)"))
        .stdout(predicate::str::contains("mitochondria").not())
        .stdout(predicate::str::contains("experiments/run1/models"));
}

#[test]
fn test_geometry_without_task_fails() {
    cmd()
        .arg("geometry")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No task selected"));
}

#[test]
fn test_geometry_full_overlap_fails() {
    cmd()
        .args(["geometry", "--aff", "3", "--overlap", "20", "4", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("leaves no room to advance"));
}

#[test]
fn test_catalog_list() {
    cmd()
        .args(["catalog", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("minnie001"))
        .stdout(predicate::str::contains("stitched_vol19-vol34"));
}

#[test]
fn test_catalog_list_unknown_collection() {
    cmd()
        .args(["catalog", "list", "--collection", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Collection 'nope' not found"));
}

#[test]
fn test_catalog_show() {
    cmd()
        .args(["catalog", "show", "minnie001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Collection: minnie"))
        .stdout(predicate::str::contains("fld.h5"));
}

#[test]
fn test_catalog_export_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.json");

    cmd()
        .args(["catalog", "export"])
        .arg(&path)
        .assert()
        .success();

    cmd()
        .args(["catalog", "show", "vol101", "--catalog"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Collection: pinky"));
}

#[test]
fn test_load_requires_targets() {
    let dir = tempdir().unwrap();
    cmd()
        .args(["load", "--data-dir"])
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn test_load_from_custom_catalog() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    std::fs::write(
        &catalog,
        r#"{"version": "1.0.0", "catalogs": [{"name": "c", "subdir": "c",
            "datasets": [{"id": "v1", "files": {"img": "img.h5", "msk": "msk.h5"}, "loc": true}]}]}"#,
    )
    .unwrap();
    write_npy(&dir.path().join("c/v1/img.h5"), &[0, 255, 0, 255]);
    write_npy(&dir.path().join("c/v1/msk.h5"), &[1, 1, 0, 1]);

    cmd()
        .args(["load", "--targets", "msk,blv", "--format", "tsv", "--data-dir"])
        .arg(dir.path())
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("v1\tmask\tuint8\t1x2x2\t3"))
        .stdout(predicate::str::contains("v1\tblood-vessel\tuint8\t1x2x2\t0"));
}

#[test]
fn test_load_strict_reports_failures() {
    let dir = tempdir().unwrap();
    cmd()
        .args(["load", "--targets", "msk", "--strict", "--data-names", "vol101", "--data-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("vol101"))
        .stderr(predicate::str::contains("1 of 1 datasets failed to load"));
}
