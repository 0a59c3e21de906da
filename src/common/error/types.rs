//! Unified error types for the sheetpress library.
//!
//! All pipeline stages report failures through the single [`Error`] enum so
//! that callers see a consistent API regardless of which stage failed.
use thiserror::Error;

/// Axis of a sheet, used to locate anchor-related failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// A row index
    Row,
    /// A column index
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Main error type for sheetpress operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Matrix dimensions inconsistent with its cell set, or a merged region
    /// out of bounds. Fatal; raised before any compression stage runs.
    #[error("Malformed matrix: {0}")]
    MalformedMatrix(String),

    /// An anchor decision could not be made deterministically. This is an
    /// internal-invariant violation surfaced with the offending row/column.
    #[error("Ambiguous anchor at {axis} {index}")]
    AmbiguousAnchor {
        /// Axis the ambiguity was detected on
        axis: Axis,
        /// Offending row or column index (original coordinates)
        index: usize,
    },

    /// A composed coordinate map failed the round-trip invariant. This is a
    /// programming-invariant check, not a recoverable user error.
    #[error("Coordinate drift introduced by stage '{stage}' at ({row}, {col})")]
    CoordinateDrift {
        /// Name of the stage whose map fragment broke the invariant
        stage: &'static str,
        /// Original row coordinate that no longer round-trips
        row: usize,
        /// Original column coordinate that no longer round-trips
        col: usize,
    },

    /// The token-counting collaborator failed. Advisory: the pipeline returns
    /// the encoded text without statistics instead of aborting.
    #[error("Tokenizer unavailable: {0}")]
    Tokenizer(String),

    /// An A1-style cell address could not be parsed.
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),
}

/// Result type for sheetpress operations.
pub type Result<T> = std::result::Result<T, Error>;
