//! Collision-aware merge of components into a target mask.

use serde::{Deserialize, Serialize};

use crate::components::Component;
use crate::error::MaskError;
use crate::mask::{check_shape, CollisionMask, Mask, FOREGROUND};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Result of [`merge_components`].
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    /// Copy of the target with accepted components written as foreground.
    pub combined: Mask,
    /// Pixels of every vetoed component.
    pub collisions: CollisionMask,
    /// Indices into the input slice of components written into `combined`.
    pub accepted: Vec<usize>,
    /// Indices into the input slice of components vetoed by a collision.
    pub collided: Vec<usize>,
}

impl MergeOutcome {
    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            accepted: self.accepted.len(),
            collided: self.collided.len(),
            collision_pixels: self.collisions.count(),
        }
    }
}

/// Counts from a merge, for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub accepted: usize,
    pub collided: usize,
    pub collision_pixels: usize,
}

/// Write `components` into a copy of `target`, one component at a time.
///
/// A component is added only if none of its pixels is already foreground in
/// the combined mask (which grows as earlier components are accepted) or in
/// the optional `baseline`. Otherwise all of its pixels are marked in the
/// collision mask and the combined mask is left untouched there. The
/// decision is all-or-nothing per component and depends on input order.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(target, components, baseline),
        fields(width = target.width, height = target.height, components = components.len())
    )
)]
pub fn merge_components(
    target: &Mask,
    components: &[Component],
    baseline: Option<&Mask>,
) -> Result<MergeOutcome, MaskError> {
    if let Some(baseline) = baseline {
        check_shape(target.shape(), baseline.shape())?;
    }
    for comp in components {
        let outside = comp
            .pixels
            .iter()
            .any(|p| p.row >= target.height || p.col >= target.width);
        if outside {
            return Err(MaskError::ComponentOutOfBounds {
                label: comp.label,
                height: target.height,
                width: target.width,
            });
        }
    }

    let mut combined = target.clone();
    let mut collisions = CollisionMask::new(target.width, target.height);
    let mut accepted = Vec::new();
    let mut collided = Vec::new();

    for (idx, comp) in components.iter().enumerate() {
        let hits = comp.pixels.iter().any(|p| {
            combined.is_foreground(p.row, p.col)
                || baseline.is_some_and(|b| b.is_foreground(p.row, p.col))
        });
        if hits {
            for p in &comp.pixels {
                collisions.set(p.row, p.col, true);
            }
            log::debug!("component {} collides with existing foreground", comp.label);
            collided.push(idx);
        } else {
            for p in &comp.pixels {
                combined.set(p.row, p.col, FOREGROUND);
            }
            accepted.push(idx);
        }
    }

    log::info!(
        "merge: {} components added, {} vetoed by collisions",
        accepted.len(),
        collided.len()
    );

    Ok(MergeOutcome {
        combined,
        collisions,
        accepted,
        collided,
    })
}
