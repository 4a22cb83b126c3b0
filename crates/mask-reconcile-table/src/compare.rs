use std::collections::HashSet;

use crate::record::{CoordinateRounding, ObjectRecord, RoundedKey};
use crate::table::ObjectTable;

/// Records of `a` whose position, keyed at `rounding`, does not occur in `b`.
///
/// Both tables are re-keyed from their true coordinates, so the rounding
/// they were loaded with does not matter. Output keeps the row order of `a`.
pub fn find_missing_records<'a>(
    a: &'a ObjectTable,
    b: &ObjectTable,
    rounding: CoordinateRounding,
) -> Vec<&'a ObjectRecord> {
    let present: HashSet<RoundedKey> = b
        .records()
        .iter()
        .map(|r| rounding.key_of(r.x, r.y))
        .collect();

    let missing: Vec<&ObjectRecord> = a
        .records()
        .iter()
        .filter(|r| !present.contains(&rounding.key_of(r.x, r.y)))
        .collect();
    log::debug!(
        "{} of {} records have no counterpart",
        missing.len(),
        a.len()
    );
    missing
}
