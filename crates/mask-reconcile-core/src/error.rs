/// Errors raised by mask construction and mask-to-mask operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    /// Two grids that must be paired have different `(height, width)`.
    #[error("mask shape mismatch: expected (height, width) = {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("invalid mask buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A component references pixels outside the grid it is merged into.
    #[error("component {label} does not fit into a {height}x{width} mask")]
    ComponentOutOfBounds {
        label: u32,
        height: usize,
        width: usize,
    },
}
