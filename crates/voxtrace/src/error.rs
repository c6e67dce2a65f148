//! Error types for voxel traversal.

use thiserror::Error;

/// Errors raised before any ray is traversed.
///
/// Rays that miss the volume or have zero length are not errors; they
/// produce empty per-ray results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    /// Grid description is malformed (non-positive spacing, negative shape, ...).
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Source and destination batches differ in length.
    #[error("shape mismatch: {sources} sources but {destinations} destinations")]
    ShapeMismatch {
        /// Number of source points supplied.
        sources: usize,
        /// Number of destination points supplied.
        destinations: usize,
    },

    /// Traversal settings are out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for traversal operations.
pub type Result<T> = std::result::Result<T, TraceError>;
