//! Connected-component labeling and per-region descriptors.
//!
//! Regions are labeled in raster order of their first pixel, so label `1`
//! is the region whose top-most, then left-most pixel comes first. Each
//! region is measured against the source mask it was derived from:
//!
//! `completeness = area / (foreground pixels of the source inside the region's bbox)`
//!
//! A region whose bounding box holds no source foreground has no defined
//! completeness and never passes the filter.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::MaskError;
use crate::mask::{check_shape, BoolGrid, DiffMask, Mask, PixelCoord};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixel adjacency used when growing regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Edge neighbours only.
    Four,
    /// Edge and diagonal neighbours.
    #[default]
    Eight,
}

const OFFSETS_4: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const OFFSETS_8: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Connectivity {
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &OFFSETS_4,
            Connectivity::Eight => &OFFSETS_8,
        }
    }
}

/// Filters applied to labeled regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentParams {
    /// Regions with fewer pixels are dropped.
    pub min_area: usize,
    /// Regions with a lower completeness ratio are dropped. In `[0, 1]`.
    pub completeness_threshold: f64,
    pub connectivity: Connectivity,
}

impl Default for ComponentParams {
    fn default() -> Self {
        Self {
            min_area: 100,
            completeness_threshold: 0.5,
            connectivity: Connectivity::Eight,
        }
    }
}

impl ComponentParams {
    /// `completeness_threshold` must lie in `[0, 1]`.
    pub fn validate(&self) -> Result<(), MaskError> {
        if !(0.0..=1.0).contains(&self.completeness_threshold) {
            return Err(MaskError::InvalidParameter {
                name: "completeness_threshold",
                reason: format!("{} is not in [0, 1]", self.completeness_threshold),
            });
        }
        Ok(())
    }
}

/// Axis-aligned bounding box, half-open on the max side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl BoundingBox {
    fn around(pixels: &[PixelCoord]) -> Option<Self> {
        let first = pixels.first()?;
        let mut bbox = BoundingBox {
            min_row: first.row,
            min_col: first.col,
            max_row: first.row + 1,
            max_col: first.col + 1,
        };
        for p in &pixels[1..] {
            bbox.min_row = bbox.min_row.min(p.row);
            bbox.min_col = bbox.min_col.min(p.col);
            bbox.max_row = bbox.max_row.max(p.row + 1);
            bbox.max_col = bbox.max_col.max(p.col + 1);
        }
        Some(bbox)
    }

    pub fn height(&self) -> usize {
        self.max_row - self.min_row
    }

    pub fn width(&self) -> usize {
        self.max_col - self.min_col
    }
}

/// A connected region of the difference mask that passed the filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// 1-based label in raster order, counted over all regions (filtered or not).
    pub label: u32,
    pub area: usize,
    /// Mean pixel position: `x` is the column, `y` is the row.
    pub centroid: Point2<f64>,
    pub bbox: BoundingBox,
    /// Member pixels in raster order.
    pub pixels: Vec<PixelCoord>,
    pub completeness: f64,
}

impl Component {
    /// Centroid as `(row, col)`.
    pub fn centroid_rc(&self) -> (f64, f64) {
        (self.centroid.y, self.centroid.x)
    }
}

/// Label connected foreground regions of `grid`.
///
/// Returns one pixel list per region, regions in raster order of their first
/// pixel, pixels within a region in raster order.
pub fn label_components(grid: &BoolGrid, connectivity: Connectivity) -> Vec<Vec<PixelCoord>> {
    let (height, width) = grid.shape();
    let mut visited = vec![false; grid.data.len()];
    let mut regions = Vec::new();
    let offsets = connectivity.offsets();

    for start in 0..grid.data.len() {
        if visited[start] || !grid.data[start] {
            continue;
        }

        let mut region = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;

        while let Some(idx) = stack.pop() {
            let row = idx / width;
            let col = idx % width;
            region.push(PixelCoord::new(row, col));

            for &(dr, dc) in offsets {
                let nr = row as isize + dr;
                let nc = col as isize + dc;
                if nr < 0 || nc < 0 || nr >= height as isize || nc >= width as isize {
                    continue;
                }
                let nidx = nr as usize * width + nc as usize;
                if grid.data[nidx] && !visited[nidx] {
                    visited[nidx] = true;
                    stack.push(nidx);
                }
            }
        }

        region.sort_unstable();
        regions.push(region);
    }

    regions
}

/// Label `diff`, measure every region against `source` and keep the ones
/// passing `params`.
///
/// `source` is the mask the difference was computed from (mask A); it must
/// have the same shape as `diff`. Invalid `params` are rejected before any
/// labeling.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(diff, source, params),
        fields(width = diff.width, height = diff.height, min_area = params.min_area)
    )
)]
pub fn extract_components(
    diff: &DiffMask,
    source: &Mask,
    params: &ComponentParams,
) -> Result<Vec<Component>, MaskError> {
    params.validate()?;
    check_shape(source.shape(), diff.shape())?;

    let regions = label_components(diff, params.connectivity);
    let total = regions.len();
    let mut out = Vec::new();

    for (idx, pixels) in regions.into_iter().enumerate() {
        let label = idx as u32 + 1;
        let area = pixels.len();
        if area < params.min_area {
            continue;
        }
        let Some(bbox) = BoundingBox::around(&pixels) else {
            continue;
        };

        let expected = source.foreground_in(bbox.min_row, bbox.min_col, bbox.max_row, bbox.max_col);
        if expected == 0 {
            log::debug!("region {label}: no source foreground in bbox, dropped");
            continue;
        }
        let completeness = area as f64 / expected as f64;
        if completeness < params.completeness_threshold {
            log::debug!(
                "region {label}: completeness {completeness:.3} below {:.3}",
                params.completeness_threshold
            );
            continue;
        }

        let (sum_r, sum_c) = pixels.iter().fold((0.0f64, 0.0f64), |(sr, sc), p| {
            (sr + p.row as f64, sc + p.col as f64)
        });
        let centroid = Point2::new(sum_c / area as f64, sum_r / area as f64);

        out.push(Component {
            label,
            area,
            centroid,
            bbox,
            pixels,
            completeness,
        });
    }

    log::info!("components: {} of {} regions kept", out.len(), total);
    Ok(out)
}
