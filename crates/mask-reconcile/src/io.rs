//! JSON configuration, file-based pipeline run and report.

use std::{
    fs,
    path::{Path, PathBuf},
};

use mask_reconcile_core::MergeSummary;
use mask_reconcile_table::{Assignment, ObjectTable, TableColumns};
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::pipeline::{ReconcileParams, Reconciler};
use crate::raster::{read_mask, write_mask};

const COMBINED_MASK_FILE: &str = "combined_mask.tif";
const COLLISION_MASK_FILE: &str = "collision_mask.tif";
const MATCHED_TABLE_FILE: &str = "matched_objects.csv";
const REPORT_FILE: &str = "report.json";

/// Inputs, outputs and parameters of one file-based run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Mask holding the objects to look for.
    pub mask_a_path: String,
    /// Baseline mask; also the merge target.
    pub mask_b_path: String,
    /// Object table describing the objects of mask A.
    pub table_path: String,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub params: ReconcileParams,
    #[serde(default)]
    pub columns: TableColumns,
}

impl ReconcileConfig {
    pub fn new(
        mask_a_path: impl Into<String>,
        mask_b_path: impl Into<String>,
        table_path: impl Into<String>,
    ) -> Self {
        Self {
            mask_a_path: mask_a_path.into(),
            mask_b_path: mask_b_path.into(),
            table_path: table_path.into(),
            output_dir: None,
            params: ReconcileParams::default(),
            columns: TableColumns::default(),
        }
    }

    /// Load a JSON config from disk and validate its parameters.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReconcileError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.params.validate()?;
        Ok(cfg)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReconcileError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("results"))
    }
}

/// Files written by [`run_files`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub combined_mask: String,
    pub collision_mask: String,
    /// Absent when nothing was matched.
    #[serde(default)]
    pub matched_table: Option<String>,
    pub report: String,
}

/// Summary of a file-based run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub mask_a_path: String,
    pub mask_b_path: String,
    pub table_path: String,
    pub params: ReconcileParams,
    pub width: usize,
    pub height: usize,
    pub num_records: usize,
    pub num_components: usize,
    pub merge: MergeSummary,
    pub assignments: Vec<Assignment>,
    pub outputs: OutputPaths,
}

impl ReconcileReport {
    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReconcileError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReconcileError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Read the inputs named by `cfg`, run the pipeline and write its outputs
/// into the configured directory.
///
/// The combined and collision masks and the report are always written;
/// the matched-record table only when at least one object was matched.
pub fn run_files(cfg: &ReconcileConfig) -> Result<ReconcileReport, ReconcileError> {
    let mask_a = read_mask(&cfg.mask_a_path)?;
    let mask_b = read_mask(&cfg.mask_b_path)?;
    let table = ObjectTable::from_path(&cfg.table_path, &cfg.columns, cfg.params.rounding)?;

    let result = Reconciler::new(cfg.params.clone()).run(&mask_a, &mask_b, &table)?;

    let out_dir = cfg.output_dir();
    fs::create_dir_all(&out_dir)?;

    let combined_path = out_dir.join(COMBINED_MASK_FILE);
    write_mask(&combined_path, result.combined())?;
    let collision_path = out_dir.join(COLLISION_MASK_FILE);
    write_mask(&collision_path, &result.collision_mask())?;

    let matched_table = if result.assignments.is_empty() {
        log::info!("no objects to add");
        None
    } else {
        let path = out_dir.join(MATCHED_TABLE_FILE);
        table.write_matched_path(&path, &result.assignments)?;
        Some(path_string(&path))
    };

    let report_path = out_dir.join(REPORT_FILE);
    let report = ReconcileReport {
        mask_a_path: cfg.mask_a_path.clone(),
        mask_b_path: cfg.mask_b_path.clone(),
        table_path: cfg.table_path.clone(),
        params: cfg.params.clone(),
        width: mask_a.width,
        height: mask_a.height,
        num_records: table.len(),
        num_components: result.components.len(),
        merge: result.merge.summary(),
        assignments: result.assignments,
        outputs: OutputPaths {
            combined_mask: path_string(&combined_path),
            collision_mask: path_string(&collision_path),
            matched_table,
            report: path_string(&report_path),
        },
    };
    report.write_json(&report_path)?;
    log::info!("results written to {}", out_dir.display());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_optional_fields() {
        let cfg: ReconcileConfig = serde_json::from_str(
            r#"{"mask_a_path":"a.tif","mask_b_path":"b.tif","table_path":"a.csv"}"#,
        )
        .expect("config");
        assert_eq!(cfg, ReconcileConfig::new("a.tif", "b.tif", "a.csv"));
        assert_eq!(cfg.output_dir(), PathBuf::from("results"));
        assert_eq!(cfg.params.components.min_area, 100);
        assert_eq!(cfg.columns.x, "xmean");
    }

    #[test]
    fn config_round_trips_through_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        let mut cfg = ReconcileConfig::new("a.tif", "b.tif", "a.csv");
        cfg.output_dir = Some("out".into());
        cfg.params.matching.max_distance = 12.5;
        cfg.write_json(&path).expect("write");
        assert_eq!(ReconcileConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn config_with_invalid_threshold_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{"mask_a_path":"a.tif","mask_b_path":"b.tif","table_path":"a.csv",
                "params":{"components":{"completeness_threshold":1.5}}}"#,
        )
        .expect("write");
        let err = ReconcileConfig::load_json(&path).expect_err("threshold");
        assert!(matches!(
            err,
            ReconcileError::Mask(mask_reconcile_core::MaskError::InvalidParameter { .. })
        ));
    }
}
