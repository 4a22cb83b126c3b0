use std::fs;
use std::path::Path;

use assert_cmd::Command;
use mask_reconcile::core::Mask;
use mask_reconcile::{read_mask, write_mask, ReconcileConfig};
use predicates::prelude::*;

fn write_masks(dir: &Path) {
    let mut a = Mask::new(30, 30);
    a.fill_rect(2, 2, 9, 9);
    a.fill_rect(15, 15, 25, 25);
    let mut b = Mask::new(30, 30);
    b.fill_rect(15, 15, 25, 25);
    write_mask(dir.join("a.tif"), &a).expect("write a");
    write_mask(dir.join("b.tif"), &b).expect("write b");
}

fn cli() -> Command {
    Command::cargo_bin("mask-reconcile").expect("binary")
}

#[test]
fn reconcile_prints_matched_objects() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_masks(dir.path());
    fs::write(
        dir.path().join("a.csv"),
        "Number,channel1_mean,xmean,ymean\n4,12.5,5.2,4.9\n9,3.0,20.0,20.0\n",
    )
    .expect("table");

    cli()
        .current_dir(dir.path())
        .args([
            "--log-level",
            "error",
            "reconcile",
            "--mask-a",
            "a.tif",
            "--mask-b",
            "b.tif",
            "--table",
            "a.csv",
            "--out-dir",
            "out",
            "--min-area",
            "20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("found 1 objects to add"))
        .stdout(predicate::str::contains(
            "object 4: coordinates=(5, 5), intensity=12.50, distance=0.0",
        ));

    assert!(dir.path().join("out/combined_mask.tif").exists());
    assert!(dir.path().join("out/collision_mask.tif").exists());
    assert!(dir.path().join("out/matched_objects.csv").exists());
}

#[test]
fn reconcile_without_inputs_fails() {
    cli()
        .args(["reconcile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn init_config_writes_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cfg.json");
    cli()
        .args(["init-config", "--out"])
        .arg(&path)
        .assert()
        .success();

    let cfg = ReconcileConfig::load_json(&path).expect("config");
    assert_eq!(cfg.params.components.min_area, 100);
    assert_eq!(cfg.params.matching.max_distance, 50.0);
}

#[test]
fn diff_writes_difference_and_fill() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_masks(dir.path());

    cli()
        .current_dir(dir.path())
        .args(["diff", "--mask-a", "a.tif", "--mask-b", "b.tif", "--out", "diff.tif"])
        .assert()
        .success();
    let diff = read_mask(dir.path().join("diff.tif")).expect("diff");
    assert_eq!(diff.foreground_count(), 49);

    cli()
        .current_dir(dir.path())
        .args([
            "diff", "--mask-a", "a.tif", "--mask-b", "b.tif", "--out", "fill.tif", "--fill",
        ])
        .assert()
        .success();
    let filled = read_mask(dir.path().join("fill.tif")).expect("fill");
    assert_eq!(filled, read_mask(dir.path().join("a.tif")).expect("a"));
}

#[test]
fn compare_tables_lists_missing_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("one.csv"),
        "Number,channel1_mean,xmean,ymean\n1,10,1.001,2\n2,20,5,5\n",
    )
    .expect("one");
    fs::write(
        dir.path().join("two.csv"),
        "Number,channel1_mean,xmean,ymean\n1,10,1,2\n",
    )
    .expect("two");

    cli()
        .current_dir(dir.path())
        .args(["compare-tables", "--a", "one.csv", "--b", "two.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "record 2: intensity=20.00, coordinates=(5.00, 5.00)",
        ))
        .stdout(predicate::str::contains("none"));
}

#[test]
fn shape_mismatch_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_masks(dir.path());
    write_mask(dir.path().join("small.tif"), &Mask::new(5, 5)).expect("small");

    cli()
        .current_dir(dir.path())
        .args(["diff", "--mask-a", "a.tif", "--mask-b", "small.tif", "--out", "d.tif"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ShapeMismatch"));
}

#[test]
fn out_of_range_settings_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_masks(dir.path());
    fs::write(
        dir.path().join("a.csv"),
        "Number,channel1_mean,xmean,ymean\n1,10,1,2\n",
    )
    .expect("table");

    cli()
        .current_dir(dir.path())
        .args(["compare-tables", "--a", "a.csv", "--b", "a.csv", "--decimals", "17"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidRounding"));

    cli()
        .current_dir(dir.path())
        .args([
            "reconcile", "--mask-a", "a.tif", "--mask-b", "b.tif", "--table", "a.csv",
            "--out-dir", "out", "--completeness", "1.5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("completeness_threshold"));
    assert!(!dir.path().join("out").exists());
}
