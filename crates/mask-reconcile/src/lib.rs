//! High-level facade for the `mask-reconcile-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core mask algorithms and the object-table crate
//! - [`Reconciler`], the end-to-end in-memory pipeline
//! - raster I/O through `image` and a JSON config/report layer
//!   ([`ReconcileConfig`], [`run_files`])
//!
//! ## Quickstart
//!
//! ```no_run
//! use mask_reconcile::{read_mask, Reconciler, ReconcileParams};
//! use mask_reconcile::table::{CoordinateRounding, ObjectTable, TableColumns};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mask_a = read_mask("2_mask.tif")?;
//! let mask_b = read_mask("3_mask.tif")?;
//! let table = ObjectTable::from_path("2_tab.csv", &TableColumns::default(), CoordinateRounding::INTEGER)?;
//!
//! let result = Reconciler::new(ReconcileParams::default()).run(&mask_a, &mask_b, &table)?;
//! for a in &result.assignments {
//!     println!("object {} at distance {:.1}", a.record.id, a.distance);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `mask_reconcile::core`: masks, differencing, component extraction, merging.
//! - `mask_reconcile::table`: CSV object tables, matching, table comparison.
//! - [`read_mask`] / [`write_mask`]: single-channel 8-bit rasters (TIFF, PNG, ...).

pub use mask_reconcile_core as core;
pub use mask_reconcile_table as table;

mod error;
mod io;
mod pipeline;
mod raster;

pub use error::ReconcileError;
pub use io::{run_files, OutputPaths, ReconcileConfig, ReconcileReport};
pub use pipeline::{ReconcileParams, ReconcileResult, Reconciler};
pub use raster::{gray_from_mask, mask_from_gray, read_mask, write_mask};

pub use mask_reconcile_core::{Component, Connectivity, Mask};
pub use mask_reconcile_table::{Assignment, CoordinateRounding, ObjectRecord, ObjectTable};
