//! Unified error types for the sheetpress library.

// Submodule declarations
pub mod types;

// Re-exports
pub use types::{Axis, Error, Result};
