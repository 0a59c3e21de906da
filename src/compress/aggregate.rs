//! Format-aware aggregation of adjacent same-signature cells.
//!
//! Aggregates *format*, not value: every cell lands in exactly one
//! rectangular block sharing one signature, values stay where they are.
//! Merge preference is horizontal-first, vertical-second, which makes the
//! block shapes deterministic.

use crate::common::CellRange;
use crate::matrix::{FormatSignature, SheetMatrix};
use serde::Serialize;

/// Stage name used in statistics.
pub const STAGE_NAME: &str = "format-aggregation";

/// A maximal rectangular run of adjacent cells sharing one format
/// signature. Coordinates are in the space of the matrix that was
/// aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatBlock {
    /// Covered range, inclusive
    pub range: CellRange,
    /// The shared signature
    pub signature: FormatSignature,
}

/// Aggregate a matrix into format blocks covering every cell exactly once.
///
/// Fully unstyled blocks are still emitted so the blocks partition the
/// grid: no gaps, no overlaps.
pub fn aggregate(matrix: &SheetMatrix) -> Vec<FormatBlock> {
    let mut blocks: Vec<FormatBlock> = Vec::new();
    // Indices into `blocks` for blocks whose bottom edge touches the
    // previous row, candidates for vertical extension.
    let mut open: Vec<usize> = Vec::new();

    for row in 0..matrix.rows() {
        let row_blocks = horizontal_runs(matrix, row);
        let mut next_open = Vec::with_capacity(row_blocks.len());

        'runs: for run in row_blocks {
            // Vertical merge: an open block directly above with the same
            // signature and the exact same column span absorbs this run.
            for &idx in &open {
                let candidate = &mut blocks[idx];
                if candidate.signature == run.signature
                    && candidate.range.col_start == run.range.col_start
                    && candidate.range.col_end == run.range.col_end
                    && candidate.range.row_end + 1 == row
                {
                    candidate.range.row_end = row;
                    next_open.push(idx);
                    continue 'runs;
                }
            }
            blocks.push(run);
            next_open.push(blocks.len() - 1);
        }
        open = next_open;
    }
    blocks
}

/// Split one row into maximal horizontal runs of identical signature.
fn horizontal_runs(matrix: &SheetMatrix, row: usize) -> Vec<FormatBlock> {
    let mut runs: Vec<FormatBlock> = Vec::new();
    for cell in matrix.row(row) {
        match runs.last_mut() {
            Some(last)
                if last.signature == cell.format && last.range.col_end + 1 == cell.col =>
            {
                last.range.col_end = cell.col;
            }
            _ => runs.push(FormatBlock {
                range: CellRange::cell(row, cell.col),
                signature: cell.format,
            }),
        }
    }
    runs
}
