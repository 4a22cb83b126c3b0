//! End-to-end reconciliation of a mask pair against an object table.
//!
//! Stages, in order:
//! 1. difference `A & !B`
//! 2. component extraction with area and completeness filters
//! 3. matching of components to table records
//! 4. merge of the same components into a copy of `B`
//!
//! Stages 3 and 4 consume the same component list independently.

use mask_reconcile_core::{
    extract_components, mask_difference, merge_components, Component, ComponentParams, Mask,
    MergeOutcome,
};
use mask_reconcile_table::{
    match_components, Assignment, CoordinateRounding, MatchParams, ObjectTable,
};
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// All tunables of the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileParams {
    #[serde(default)]
    pub components: ComponentParams,
    #[serde(default)]
    pub matching: MatchParams,
    /// Granularity of coordinate keys used when loading the table.
    #[serde(default)]
    pub rounding: CoordinateRounding,
}

impl ReconcileParams {
    /// Check the component filter and the match cutoff. The rounding is
    /// validated when it is built.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        self.components.validate()?;
        self.matching.validate()?;
        Ok(())
    }
}

/// In-memory pipeline output.
#[derive(Clone, Debug)]
pub struct ReconcileResult {
    /// Components of `A & !B` that passed the filters, in label order.
    pub components: Vec<Component>,
    pub assignments: Vec<Assignment>,
    /// `B` plus every non-colliding component, and the collision mask.
    pub merge: MergeOutcome,
}

impl ReconcileResult {
    pub fn combined(&self) -> &Mask {
        &self.merge.combined
    }

    pub fn collision_mask(&self) -> Mask {
        self.merge.collisions.to_mask()
    }
}

/// Pipeline entry point; holds the parameters, no other state.
#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    params: ReconcileParams,
}

impl Reconciler {
    pub fn new(params: ReconcileParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ReconcileParams {
        &self.params
    }

    /// Run all stages on `mask_a` (source of new objects) and `mask_b`
    /// (baseline and merge target).
    ///
    /// Matching uses the rounding the table was loaded with.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, mask_a, mask_b, table),
            fields(width = mask_a.width, height = mask_a.height, records = table.len())
        )
    )]
    pub fn run(
        &self,
        mask_a: &Mask,
        mask_b: &Mask,
        table: &ObjectTable,
    ) -> Result<ReconcileResult, ReconcileError> {
        self.params.validate()?;
        let diff = mask_difference(mask_a, mask_b)?;
        let components = extract_components(&diff, mask_a, &self.params.components)?;
        let assignments = match_components(&components, table, &self.params.matching);
        let merge = merge_components(mask_b, &components, None)?;

        Ok(ReconcileResult {
            components,
            assignments,
            merge,
        })
    }
}
