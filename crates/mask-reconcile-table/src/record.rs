use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Largest supported number of decimals. Keys of `|v| < 10^9` at this
/// granularity stay exact in both `i64` and `f64`.
pub const MAX_DECIMALS: u32 = 9;

/// Keys beyond this magnitude are no longer exact integers in `f64`.
const MAX_EXACT_KEY: f64 = 9_007_199_254_740_992.0;

#[derive(Deserialize)]
struct RoundingSpec {
    decimals: u32,
}

impl TryFrom<RoundingSpec> for CoordinateRounding {
    type Error = TableError;

    fn try_from(spec: RoundingSpec) -> Result<Self, Self::Error> {
        Self::new(spec.decimals)
    }
}

/// Granularity of coordinate keys.
///
/// A value `v` is keyed as `round_half_even(v * 10^decimals)`. With
/// `decimals = 0` the key is the value rounded to the nearest integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RoundingSpec")]
pub struct CoordinateRounding {
    decimals: u32,
}

impl CoordinateRounding {
    /// Whole pixels, used for component-to-record matching.
    pub const INTEGER: Self = Self { decimals: 0 };
    /// Hundredths, used for record-to-record comparison.
    pub const HUNDREDTHS: Self = Self { decimals: 2 };

    /// Fails for more than [`MAX_DECIMALS`] decimals.
    pub fn new(decimals: u32) -> Result<Self, TableError> {
        if decimals > MAX_DECIMALS {
            return Err(TableError::InvalidRounding {
                decimals,
                max: MAX_DECIMALS,
            });
        }
        Ok(Self { decimals })
    }

    pub fn decimals(self) -> u32 {
        self.decimals
    }

    #[inline]
    fn scale(self) -> f64 {
        10f64.powi(self.decimals as i32)
    }

    /// Key of `value`. Saturates for values outside [`Self::checked_key`]'s range.
    #[inline]
    pub fn key(self, value: f64) -> i64 {
        (value * self.scale()).round_ties_even() as i64
    }

    /// Key of `value`, or `None` when the scaled value is not finite or too
    /// large to be keyed exactly.
    pub fn checked_key(self, value: f64) -> Option<i64> {
        let scaled = (value * self.scale()).round_ties_even();
        (scaled.is_finite() && scaled.abs() <= MAX_EXACT_KEY).then_some(scaled as i64)
    }

    /// Value represented by a key, in original units.
    #[inline]
    pub fn value(self, key: i64) -> f64 {
        key as f64 / self.scale()
    }

    pub fn key_of(self, x: f64, y: f64) -> RoundedKey {
        RoundedKey {
            x: self.key(x),
            y: self.key(y),
        }
    }

    /// Render a key with exactly `decimals` fractional digits.
    pub fn format(self, key: i64) -> String {
        format!("{:.*}", self.decimals as usize, self.value(key))
    }
}

/// Rounded `(x, y)` key of a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundedKey {
    pub x: i64,
    pub y: i64,
}

impl RoundedKey {
    /// Euclidean distance between two keys, in original units.
    pub fn distance(&self, other: &RoundedKey, rounding: CoordinateRounding) -> f64 {
        let dx = rounding.value(self.x) - rounding.value(other.x);
        let dy = rounding.value(self.y) - rounding.value(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Required fields of one table row, before keying.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: i64,
    pub intensity: f64,
    pub x: f64,
    pub y: f64,
}

/// One loaded table row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// 0-based row position in the table.
    pub index: usize,
    pub id: i64,
    pub intensity: f64,
    pub x: f64,
    pub y: f64,
    /// Rounded `(x, y)`, for lookups only.
    pub key: RoundedKey,
}

impl ObjectRecord {
    pub fn new(index: usize, raw: RawRecord, rounding: CoordinateRounding) -> Self {
        Self {
            index,
            id: raw.id,
            intensity: raw.intensity,
            x: raw.x,
            y: raw.y,
            key: rounding.key_of(raw.x, raw.y),
        }
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}
