//! The compression pipeline: anchors, inverted index, format aggregation,
//! and the coordinate map that keeps every artifact addressable.
//!
//! Stages are independently toggleable but always compose in a fixed
//! order; each consumes the previous stage's matrix and coordinate map and
//! derives new ones. See [`SheetCompressor`] for the entry point.

// Submodule declarations
pub mod aggregate;
pub mod anchor;
pub mod config;
pub mod coordmap;
pub mod index;
pub mod pipeline;
#[cfg(test)]
mod tests;

// Re-exports
pub use aggregate::FormatBlock;
pub use anchor::{AnchorReason, AnchorSet, OmittedRun};
pub use config::CompressorOptions;
pub use coordmap::{CompressedRef, CoordinateMap, MapFragment};
pub use index::{AddressRun, ValueIndex, ValueIndexEntry};
pub use pipeline::{CompressedSheet, CompressionStats, SheetCompressor, StageStats};
