use serde::{Deserialize, Serialize};

use crate::error::MaskError;

/// Pixel value marking foreground.
pub const FOREGROUND: u8 = 255;
/// Value written for background when a grid is rendered to bytes.
pub const BACKGROUND: u8 = 0;

/// Integer pixel position, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PixelCoord {
    pub row: usize,
    pub col: usize,
}

impl PixelCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Single-channel 8-bit mask.
///
/// Only the value [`FOREGROUND`] counts as foreground; every other value is
/// background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>, // row-major, len = w*h
}

impl Mask {
    /// All-background mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![BACKGROUND; width * height],
        }
    }

    /// Wrap a row-major buffer, validating its length.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, MaskError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(MaskError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// `(height, width)`, the order used in every shape error.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.data[row * self.width + col] = value;
    }

    #[inline]
    pub fn is_foreground(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == FOREGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == FOREGROUND).count()
    }

    /// Set the half-open rectangle `[row0, row1) x [col0, col1)` to foreground.
    pub fn fill_rect(&mut self, row0: usize, col0: usize, row1: usize, col1: usize) {
        let col1 = col1.min(self.width);
        if col0 >= col1 {
            return;
        }
        for row in row0..row1.min(self.height) {
            let start = row * self.width;
            for v in &mut self.data[start + col0..start + col1] {
                *v = FOREGROUND;
            }
        }
    }

    /// Count foreground pixels inside the half-open window `[row0, row1) x [col0, col1)`.
    pub fn foreground_in(&self, row0: usize, col0: usize, row1: usize, col1: usize) -> usize {
        let row1 = row1.min(self.height);
        let col1 = col1.min(self.width);
        if col0 >= col1 {
            return 0;
        }
        (row0..row1)
            .map(|row| {
                let start = row * self.width;
                self.data[start + col0..start + col1]
                    .iter()
                    .filter(|&&v| v == FOREGROUND)
                    .count()
            })
            .sum()
    }

    pub fn ensure_same_shape(&self, other: &Mask) -> Result<(), MaskError> {
        check_shape(self.shape(), other.shape())
    }
}

pub(crate) fn check_shape(expected: (usize, usize), got: (usize, usize)) -> Result<(), MaskError> {
    if expected != got {
        return Err(MaskError::ShapeMismatch { expected, got });
    }
    Ok(())
}

/// Boolean grid with the same layout as [`Mask`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoolGrid {
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>,
}

/// Output of the mask differ: true where A is foreground and B is not.
pub type DiffMask = BoolGrid;

/// Pixels of vetoed components during a merge.
pub type CollisionMask = BoolGrid;

impl BoolGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.data[row * self.width + col] = value;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Render as a 0/255 mask.
    pub fn to_mask(&self) -> Mask {
        Mask {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|&v| if v { FOREGROUND } else { BACKGROUND })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_255_counts_as_foreground() {
        let mask = Mask::from_raw(3, 1, vec![255, 254, 1]).expect("mask");
        assert!(mask.is_foreground(0, 0));
        assert!(!mask.is_foreground(0, 1));
        assert!(!mask.is_foreground(0, 2));
        assert_eq!(mask.foreground_count(), 1);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        let err = Mask::from_raw(4, 4, vec![0; 15]).expect_err("should fail");
        assert_eq!(
            err,
            MaskError::InvalidBuffer {
                expected: 16,
                got: 15
            }
        );
    }

    #[test]
    fn foreground_in_window_is_half_open() {
        let mut mask = Mask::new(6, 6);
        mask.fill_rect(1, 1, 4, 4);
        assert_eq!(mask.foreground_in(0, 0, 6, 6), 9);
        assert_eq!(mask.foreground_in(1, 1, 3, 3), 4);
        assert_eq!(mask.foreground_in(4, 4, 6, 6), 0);
    }

    #[test]
    fn shape_check_reports_both_shapes() {
        let a = Mask::new(4, 3);
        let b = Mask::new(3, 4);
        assert_eq!(
            a.ensure_same_shape(&b),
            Err(MaskError::ShapeMismatch {
                expected: (3, 4),
                got: (4, 3)
            })
        );
    }

    #[test]
    fn bool_grid_renders_sentinel() {
        let mut grid = BoolGrid::new(2, 2);
        grid.set(1, 0, true);
        let mask = grid.to_mask();
        assert_eq!(mask.data, vec![0, 0, 255, 0]);
    }
}
