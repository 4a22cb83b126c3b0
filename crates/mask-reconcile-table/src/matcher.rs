//! One-to-one nearest-record matching of mask components.

use std::collections::HashSet;

use mask_reconcile_core::Component;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::record::{ObjectRecord, RoundedKey};
use crate::table::ObjectTable;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Matching settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// A record is accepted only if strictly closer than this.
    pub max_distance: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self { max_distance: 50.0 }
    }
}

impl MatchParams {
    /// The cutoff must be a non-negative finite distance.
    pub fn validate(&self) -> Result<(), TableError> {
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(TableError::InvalidParameter {
                name: "max_distance",
                reason: format!("{} is not a finite non-negative distance", self.max_distance),
            });
        }
        Ok(())
    }
}

/// A component paired with the record it was matched to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Position of the component in the matcher input.
    pub component_index: usize,
    pub component_label: u32,
    pub record: ObjectRecord,
    /// Rounded component centroid as `(x = col, y = row)`.
    pub found: RoundedKey,
    /// `found` in original units.
    pub found_position: Point2<f64>,
    /// Distance between `found` and the record key.
    pub distance: f64,
}

/// Assign each component to at most one record and each record to at most
/// one component.
///
/// Components are visited in input order. For each, the rounded centroid is
/// compared with every record key; the nearest record that is still unused
/// and closer than `max_distance` is taken. Equal distances go to the lower
/// record index. Components with no candidate are skipped.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(components, table, params),
        fields(components = components.len(), records = table.len())
    )
)]
pub fn match_components(
    components: &[Component],
    table: &ObjectTable,
    params: &MatchParams,
) -> Vec<Assignment> {
    let rounding = table.rounding();
    let records = table.records();
    let mut used: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();

    for (component_index, comp) in components.iter().enumerate() {
        let found = rounding.key_of(comp.centroid.x, comp.centroid.y);

        let mut candidates: Vec<(f64, &ObjectRecord)> = records
            .iter()
            .map(|rec| (found.distance(&rec.key, rounding), rec))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.index.cmp(&b.1.index)));

        let Some((distance, rec)) = candidates
            .into_iter()
            .find(|(d, rec)| !used.contains(&rec.index) && *d < params.max_distance)
        else {
            log::debug!(
                "component {} at ({}, {}): no record within {}",
                comp.label,
                found.x,
                found.y,
                params.max_distance
            );
            continue;
        };

        used.insert(rec.index);
        out.push(Assignment {
            component_index,
            component_label: comp.label,
            record: rec.clone(),
            found,
            found_position: Point2::new(rounding.value(found.x), rounding.value(found.y)),
            distance,
        });
    }

    log::info!(
        "matched {} of {} components to records",
        out.len(),
        components.len()
    );
    out
}
