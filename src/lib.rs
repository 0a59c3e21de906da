//! Sheetpress - token-efficient compression of spreadsheet grids
//!
//! This library turns a parsed spreadsheet (a typed, formatted grid with
//! merged regions) into a compact, layered text encoding while keeping
//! every compressed artifact addressable back to its original cell.
//!
//! # Pipeline
//!
//! Three independently toggleable stages run in a fixed order:
//!
//! - **Structural anchors**: detect boundary rows/columns from type and
//!   format transitions and keep only a proximity window around them
//! - **Inverted index**: cluster repeated values and rewrite repeats as
//!   reference tokens into a value index
//! - **Format aggregation**: merge adjacent same-signature cells into
//!   rectangular blocks covering the grid exactly once
//!
//! A coordinate map is composed across the stages, so any address in the
//! output resolves back to the original coordinates it stands for.
//!
//! # Example
//!
//! ```rust
//! use sheetpress::compress::{CompressorOptions, SheetCompressor};
//! use sheetpress::matrix::{CellValue, FormatSignature, SheetMatrix};
//!
//! // Build a matrix (normally produced by a SheetSource implementation).
//! let mut builder = SheetMatrix::builder("Q1", 3, 2);
//! builder.set(0, 0, CellValue::Text("Region".into()), FormatSignature::plain());
//! builder.set(1, 0, CellValue::Text("north".into()), FormatSignature::plain());
//! builder.set(1, 1, CellValue::Int(120), FormatSignature::plain());
//! let matrix = builder.finish()?;
//!
//! // Compress with anchors plus the inverted index.
//! let compressor = SheetCompressor::new(
//!     CompressorOptions::new().with_inverted_index(true),
//! );
//! let compressed = compressor.compress(&matrix)?;
//!
//! println!("{}", compressed.text);
//! if let Some(stats) = &compressed.stats {
//!     println!("ratio: {:.2}", stats.ratio);
//! }
//!
//! // Any retained coordinate resolves back through the map.
//! let reference = compressed.map.compressed_of(1, 1).unwrap();
//! assert!(compressed.map.original_of(reference).contains(&(1, 1)));
//! # Ok::<(), sheetpress::Error>(())
//! ```
//!
//! # Collaborators
//!
//! File ingestion and token counting stay outside the core: implement
//! [`matrix::SheetSource`] to feed matrices in, and [`matrix::TokenCounter`]
//! to wire up a real tokenizer for the statistics. The built-in
//! [`matrix::HeuristicTokenCounter`] covers both tests and casual use.

/// Common addressing, color, and error types
pub mod common;

/// The compression pipeline and its coordinate map
pub mod compress;

/// Serialization of pipeline results into the layered text encoding
pub(crate) mod encode;

/// The typed, formatted grid abstraction and collaborator seams
pub mod matrix;

// Top-level re-exports
pub use common::{Error, Result};
pub use compress::{CompressedSheet, CompressionStats, CompressorOptions, SheetCompressor};
pub use matrix::{Cell, CellValue, DataType, FormatSignature, SheetMatrix};
