//! Common types shared across the compression pipeline.

// Submodule declarations
pub mod address;
pub mod color;
pub mod error;

// Re-exports
pub use address::{CellRange, column_index, column_letter, format_address, parse_address};
pub use color::RGBColor;
pub use error::{Axis, Error, Result};
