//! Tabular object records and their reconciliation against mask components.
//!
//! A table is a CSV with one row per detected object. Four columns are
//! required (id, intensity, x, y; names configurable through
//! [`TableColumns`]); all other columns are carried through untouched and
//! reappear in the matched-record output.
//!
//! Coordinates are keyed by [`CoordinateRounding`]: integer keys at a fixed
//! number of decimals, used for matching and set comparison only. The real
//! position is always kept alongside.

mod compare;
mod error;
mod matcher;
mod record;
mod table;

pub use compare::find_missing_records;
pub use error::TableError;
pub use matcher::{match_components, Assignment, MatchParams};
pub use record::{CoordinateRounding, ObjectRecord, RawRecord, RoundedKey, MAX_DECIMALS};
pub use table::{ObjectTable, TableColumns};
