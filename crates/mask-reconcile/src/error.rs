use std::path::PathBuf;

use mask_reconcile_core::MaskError;
use mask_reconcile_table::TableError;

/// Errors produced by the end-to-end pipeline and its file helpers.
#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("{}: expected a single-channel 8-bit raster, got {color:?}", path.display())]
    UnsupportedPixelFormat {
        path: PathBuf,
        color: image::ColorType,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
