//! Pixel-level set difference between two masks.

use crate::error::MaskError;
use crate::mask::{check_shape, DiffMask, Mask, FOREGROUND};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixels that are foreground in `a` and not foreground in `b`.
///
/// The direction is fixed: foreground present only in `b` is ignored. Swap
/// the arguments to get the other side.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(a, b), fields(width = a.width, height = a.height))
)]
pub fn mask_difference(a: &Mask, b: &Mask) -> Result<DiffMask, MaskError> {
    check_shape(a.shape(), b.shape())?;
    let data: Vec<bool> = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&pa, &pb)| pa == FOREGROUND && pb != FOREGROUND)
        .collect();
    let diff = DiffMask {
        width: a.width,
        height: a.height,
        data,
    };
    log::debug!(
        "mask difference: {} of {} pixels only in A",
        diff.count(),
        diff.data.len()
    );
    Ok(diff)
}

/// Copy of `b` with every pixel that is foreground only in `a` set to foreground.
pub fn fill_missing(a: &Mask, b: &Mask) -> Result<Mask, MaskError> {
    let diff = mask_difference(a, b)?;
    let mut out = b.clone();
    for (dst, &missing) in out.data.iter_mut().zip(&diff.data) {
        if missing {
            *dst = FOREGROUND;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(width: usize, height: usize, on: &[(usize, usize)]) -> Mask {
        let mut mask = Mask::new(width, height);
        for &(r, c) in on {
            mask.set(r, c, FOREGROUND);
        }
        mask
    }

    #[test]
    fn difference_is_a_and_not_b() {
        let a = mask_from(3, 3, &[(0, 0), (1, 1), (2, 2)]);
        let b = mask_from(3, 3, &[(1, 1), (0, 2)]);
        let diff = mask_difference(&a, &b).expect("diff");
        for r in 0..3 {
            for c in 0..3 {
                let expected = a.is_foreground(r, c) && !b.is_foreground(r, c);
                assert_eq!(diff.get(r, c), expected, "pixel ({r}, {c})");
            }
        }
        assert_eq!(diff.count(), 2);
    }

    #[test]
    fn difference_with_itself_is_empty() {
        let mut a = Mask::new(8, 5);
        a.fill_rect(1, 2, 4, 7);
        let diff = mask_difference(&a, &a).expect("diff");
        assert!(diff.is_empty());
    }

    #[test]
    fn non_sentinel_values_in_b_do_not_mask_out_a() {
        let a = Mask::from_raw(2, 1, vec![255, 255]).expect("a");
        let b = Mask::from_raw(2, 1, vec![254, 255]).expect("b");
        let diff = mask_difference(&a, &b).expect("diff");
        assert_eq!(diff.data, vec![true, false]);
    }

    #[test]
    fn mismatched_shapes_always_fail() {
        let shapes = [(1, 1), (3, 4), (4, 3), (0, 5), (10, 10)];
        for &(wa, ha) in &shapes {
            for &(wb, hb) in &shapes {
                if (wa, ha) == (wb, hb) {
                    continue;
                }
                let err = mask_difference(&Mask::new(wa, ha), &Mask::new(wb, hb))
                    .expect_err("shape mismatch");
                assert!(matches!(err, MaskError::ShapeMismatch { .. }));
            }
        }
    }

    #[test]
    fn fill_missing_adds_only_a_pixels() {
        let a = mask_from(3, 2, &[(0, 0), (1, 2)]);
        let b = Mask::from_raw(3, 2, vec![0, 255, 7, 0, 0, 0]).expect("b");
        let merged = fill_missing(&a, &b).expect("merge");
        assert_eq!(merged.data, vec![255, 255, 7, 0, 0, 255]);
        assert_eq!(b.data, vec![0, 255, 7, 0, 0, 0]);
    }
}
