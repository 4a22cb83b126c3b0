/// Errors produced while loading or writing object tables.
#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    /// A row lacks a required field or holds a non-numeric value there.
    #[error("malformed record at row {row}, column `{column}`: {reason}")]
    MalformedRecord {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("{decimals} decimals requested, at most {max} are supported")]
    InvalidRounding { decimals: u32, max: u32 },

    #[error("invalid `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// An assignment refers to a record that is not part of this table.
    #[error("record {id} (row {row}) is not part of this table")]
    ForeignRecord { id: i64, row: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
