//! Core types and algorithms for reconciling two binary segmentation masks.
//!
//! The crate works purely on in-memory grids. Raster decoding and CSV
//! handling live in the sibling crates; everything here takes a [`Mask`]
//! (row-major `u8`, foreground = 255) and returns new grids.
//!
//! Pipeline stages exposed here, leaves first:
//! 1. [`mask_difference`]: pixels that are foreground in A but not in B.
//! 2. [`extract_components`]: label the difference, measure each region and
//!    drop the ones that are too small or too fragmentary.
//! 3. [`merge_components`]: write surviving regions into a copy of a target
//!    mask, vetoing any region that touches existing foreground.
//!
//! ```
//! use mask_reconcile_core::{extract_components, mask_difference, ComponentParams, Mask};
//!
//! let mut a = Mask::new(10, 10);
//! a.fill_rect(2, 2, 7, 7);
//! let b = Mask::new(10, 10);
//!
//! let diff = mask_difference(&a, &b).unwrap();
//! let params = ComponentParams { min_area: 20, ..ComponentParams::default() };
//! let components = extract_components(&diff, &a, &params).unwrap();
//! assert_eq!(components.len(), 1);
//! assert_eq!(components[0].area, 25);
//! ```

mod components;
mod diff;
mod error;
mod logger;
mod mask;
mod merge;

pub use components::{
    extract_components, label_components, BoundingBox, Component, ComponentParams, Connectivity,
};
pub use diff::{fill_missing, mask_difference};
pub use error::MaskError;
pub use mask::{BoolGrid, CollisionMask, DiffMask, Mask, PixelCoord, BACKGROUND, FOREGROUND};
pub use merge::{merge_components, MergeOutcome, MergeSummary};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
