//! The typed, formatted grid abstraction and its collaborator seams.
//!
//! A [`SheetMatrix`] is the read-only input to every compression stage:
//! a dense row-major grid of [`Cell`]s plus merged regions. Stages derive
//! new matrices; nothing here is mutated after construction.

// Submodule declarations
pub mod cell;
pub mod sheet;
pub mod traits;

// Re-exports
pub use cell::{Cell, CellValue, DataType, FormatFlags, FormatSignature};
pub use sheet::{MergedRegion, SheetMatrix, SheetMatrixBuilder};
pub use traits::{HeuristicTokenCounter, SheetSource, TokenCounter};
