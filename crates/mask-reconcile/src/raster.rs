//! Mask rasters on disk, via the `image` crate.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageReader};
use mask_reconcile_core::{Mask, MaskError};

use crate::error::ReconcileError;

/// Convert an `image::GrayImage` into a [`Mask`] without copying pixels.
pub fn mask_from_gray(img: GrayImage) -> Mask {
    let width = img.width() as usize;
    let height = img.height() as usize;
    Mask {
        width,
        height,
        data: img.into_raw(),
    }
}

/// Copy a [`Mask`] into an `image::GrayImage`.
pub fn gray_from_mask(mask: &Mask) -> Result<GrayImage, ReconcileError> {
    GrayImage::from_raw(mask.width as u32, mask.height as u32, mask.data.clone()).ok_or(
        ReconcileError::Mask(MaskError::InvalidBuffer {
            expected: mask.width * mask.height,
            got: mask.data.len(),
        }),
    )
}

/// Read a single-channel 8-bit raster. Any other pixel layout is rejected
/// rather than converted, so foreground values are never rescaled.
pub fn read_mask(path: impl AsRef<Path>) -> Result<Mask, ReconcileError> {
    let path = path.as_ref();
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    match img {
        DynamicImage::ImageLuma8(gray) => {
            log::debug!(
                "read mask {} ({}x{})",
                path.display(),
                gray.width(),
                gray.height()
            );
            Ok(mask_from_gray(gray))
        }
        other => Err(ReconcileError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            color: other.color(),
        }),
    }
}

/// Write a mask; the format follows the file extension.
pub fn write_mask(path: impl AsRef<Path>, mask: &Mask) -> Result<(), ReconcileError> {
    let path = path.as_ref();
    gray_from_mask(mask)?.save(path)?;
    log::debug!("wrote mask {}", path.display());
    Ok(())
}
