//! Structural-anchor extraction.
//!
//! Boundary rows and columns are detected from fingerprint transitions, and
//! only a proximity window around each anchor is retained. Dropped runs
//! collapse into addressable markers so no coordinate is silently lost.

use super::coordmap::{CompressedRef, MapFragment};
use crate::common::{Axis, Error, Result};
use crate::matrix::{Cell, DataType, SheetMatrix};
use std::collections::BTreeMap;

/// Why a row or column was flagged as an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorReason {
    /// Type sequence differs from the previous non-blank line
    TypeTransition,
    /// Format-class sequence differs from the previous non-blank line
    FormatTransition,
    /// First non-empty line after a run of one or more empty lines,
    /// including a blank run at the start of the sheet
    ContentResumption,
    /// First or last line of the sheet
    SheetEdge,
}

impl std::fmt::Display for AnchorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnchorReason::TypeTransition => "type-transition",
            AnchorReason::FormatTransition => "format-transition",
            AnchorReason::ContentResumption => "content-resumption",
            AnchorReason::SheetEdge => "sheet-edge",
        };
        f.write_str(name)
    }
}

/// Rows and columns flagged as structurally significant, each with the
/// reasons it qualified. A line qualifying several ways is recorded once
/// with its reasons concatenated.
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    rows: BTreeMap<usize, Vec<AnchorReason>>,
    cols: BTreeMap<usize, Vec<AnchorReason>>,
}

impl AnchorSet {
    /// Anchor rows in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[AnchorReason])> {
        self.rows.iter().map(|(idx, reasons)| (*idx, reasons.as_slice()))
    }

    /// Anchor columns in ascending order.
    pub fn cols(&self) -> impl Iterator<Item = (usize, &[AnchorReason])> {
        self.cols.iter().map(|(idx, reasons)| (*idx, reasons.as_slice()))
    }

    /// Whether no anchors were found on either axis.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }

    fn insert(&mut self, axis: Axis, index: usize, reasons: Vec<AnchorReason>) -> Result<()> {
        if reasons.is_empty() {
            return Err(Error::AmbiguousAnchor { axis, index });
        }
        let map = match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.cols,
        };
        map.entry(index).or_default().extend(reasons);
        Ok(())
    }
}

/// Coarse format class used in fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatClass {
    /// No styling
    Plain,
    /// Font emphasis (bold/italic/underline)
    Emphasis,
    /// Visual decoration (fill, border, colors)
    Decorated,
}

impl FormatClass {
    fn of(cell: &Cell) -> Self {
        if cell.format.is_decorated() {
            FormatClass::Decorated
        } else if cell.format.is_emphasized() {
            FormatClass::Emphasis
        } else {
            FormatClass::Plain
        }
    }
}

/// Fingerprint of one row or column: the ordered `(type, format-class)`
/// sequence over its non-empty cells, plus whether any cell is styled.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    entries: Vec<(DataType, FormatClass)>,
    has_styled: bool,
}

impl Fingerprint {
    fn of<'a>(cells: impl Iterator<Item = &'a Cell>) -> Self {
        let mut entries = Vec::new();
        let mut has_styled = false;
        for cell in cells {
            if !cell.format.is_plain() {
                has_styled = true;
            }
            if !cell.is_empty() {
                entries.push((cell.data_type, FormatClass::of(cell)));
            }
        }
        Self { entries, has_styled }
    }

    fn is_blank(&self) -> bool {
        self.entries.is_empty()
    }

    fn types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.entries.iter().map(|(ty, _)| *ty)
    }

    fn classes(&self) -> impl Iterator<Item = FormatClass> + '_ {
        self.entries.iter().map(|(_, class)| *class)
    }
}

/// A maximal contiguous run of dropped rows or columns, original bounds
/// inclusive. Carries no value of its own; addressable through the
/// coordinate map as a range marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OmittedRun {
    /// First dropped index
    pub start: usize,
    /// Last dropped index
    pub end: usize,
}

impl OmittedRun {
    /// Number of dropped lines in the run.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Runs are never empty; present for API symmetry.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Result of the structural-anchor stage.
#[derive(Debug)]
pub struct AnchorExtraction {
    /// Reduced matrix, retained rows/columns reindexed compactly
    pub matrix: SheetMatrix,
    /// The anchors and their reasons
    pub anchors: AnchorSet,
    /// Maximal dropped row runs, original coordinates
    pub omitted_rows: Vec<OmittedRun>,
    /// Maximal dropped column runs, original coordinates
    pub omitted_cols: Vec<OmittedRun>,
    /// Original index of each retained row
    pub row_origin: Vec<usize>,
    /// Original index of each retained column
    pub col_origin: Vec<usize>,
    /// Coordinate-map fragment describing the reduction
    pub fragment: MapFragment,
}

/// Detect anchors and reduce the matrix to proximity windows around them.
///
/// `proximity` is the number of lines retained on each side of an anchor.
/// An entirely empty matrix yields no anchors; both axes collapse into a
/// single whole-axis marker each.
pub fn extract(matrix: &SheetMatrix, proximity: usize) -> Result<AnchorExtraction> {
    let mut anchors = AnchorSet::default();

    if !matrix.is_empty() {
        let row_prints: Vec<Fingerprint> = (0..matrix.rows())
            .map(|r| Fingerprint::of(matrix.row(r)))
            .collect();
        let col_prints: Vec<Fingerprint> = (0..matrix.cols())
            .map(|c| Fingerprint::of(matrix.column(c)))
            .collect();
        detect_axis(&mut anchors, Axis::Row, &row_prints)?;
        detect_axis(&mut anchors, Axis::Column, &col_prints)?;
    }

    let row_origin = expand(anchors.rows.keys().copied(), proximity, matrix.rows());
    let col_origin = expand(anchors.cols.keys().copied(), proximity, matrix.cols());
    let omitted_rows = omitted_runs(&row_origin, matrix.rows());
    let omitted_cols = omitted_runs(&col_origin, matrix.cols());

    let reduced = matrix.project(&row_origin, &col_origin);
    let fragment = build_fragment(
        matrix,
        &row_origin,
        &col_origin,
        &omitted_rows,
        &omitted_cols,
    );

    Ok(AnchorExtraction {
        matrix: reduced,
        anchors,
        omitted_rows,
        omitted_cols,
        row_origin,
        col_origin,
        fragment,
    })
}

/// Flag anchors along one axis from its fingerprint sequence.
fn detect_axis(anchors: &mut AnchorSet, axis: Axis, prints: &[Fingerprint]) -> Result<()> {
    let len = prints.len();
    let mut prev_nonblank: Option<&Fingerprint> = None;
    let mut blank_run = false;

    for (index, print) in prints.iter().enumerate() {
        let mut reasons = Vec::new();
        if index == 0 || index + 1 == len {
            reasons.push(AnchorReason::SheetEdge);
        }
        if print.is_blank() {
            if !reasons.is_empty() {
                anchors.insert(axis, index, reasons)?;
            }
            blank_run = true;
            continue;
        }
        if blank_run {
            reasons.push(AnchorReason::ContentResumption);
        }
        if let Some(prev) = prev_nonblank {
            if !print.types().eq(prev.types()) {
                reasons.push(AnchorReason::TypeTransition);
            }
            if !print.classes().eq(prev.classes()) || print.has_styled != prev.has_styled {
                reasons.push(AnchorReason::FormatTransition);
            }
        }
        if !reasons.is_empty() {
            anchors.insert(axis, index, reasons)?;
        }
        prev_nonblank = Some(print);
        blank_run = false;
    }
    Ok(())
}

/// Union of `[anchor - p, anchor + p]` windows clamped to `[0, len)`,
/// as a sorted deduplicated index list.
fn expand(anchors: impl Iterator<Item = usize>, proximity: usize, len: usize) -> Vec<usize> {
    let mut keep = vec![false; len];
    for anchor in anchors {
        let lo = anchor.saturating_sub(proximity);
        let hi = (anchor + proximity).min(len.saturating_sub(1));
        for slot in &mut keep[lo..=hi] {
            *slot = true;
        }
    }
    keep.iter()
        .enumerate()
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect()
}

/// Collapse dropped indices into maximal contiguous runs.
fn omitted_runs(kept: &[usize], len: usize) -> Vec<OmittedRun> {
    let mut runs = Vec::new();
    let mut kept_iter = kept.iter().copied().peekable();
    let mut idx = 0;
    while idx < len {
        if kept_iter.peek() == Some(&idx) {
            kept_iter.next();
            idx += 1;
            continue;
        }
        let start = idx;
        while idx < len && kept_iter.peek() != Some(&idx) {
            idx += 1;
        }
        runs.push(OmittedRun {
            start,
            end: idx - 1,
        });
    }
    runs
}

/// Map every previous-space cell to its fate: a compacted coordinate or an
/// omitted-run marker. Dropped rows take precedence over dropped columns
/// when both apply.
fn build_fragment(
    matrix: &SheetMatrix,
    row_origin: &[usize],
    col_origin: &[usize],
    omitted_rows: &[OmittedRun],
    omitted_cols: &[OmittedRun],
) -> MapFragment {
    let mut fragment = MapFragment::new(STAGE_NAME);
    let row_target: Vec<Option<usize>> = invert(row_origin, matrix.rows());
    let col_target: Vec<Option<usize>> = invert(col_origin, matrix.cols());

    for row in 0..matrix.rows() {
        for col in 0..matrix.cols() {
            match (row_target[row], col_target[col]) {
                (Some(new_row), Some(new_col)) => fragment.retain(row, col, new_row, new_col),
                (None, _) => {
                    let run = run_containing(omitted_rows, row);
                    fragment.redirect(
                        row,
                        col,
                        CompressedRef::RowRun {
                            start: run.start,
                            end: run.end,
                        },
                    );
                }
                (Some(_), None) => {
                    let run = run_containing(omitted_cols, col);
                    fragment.redirect(
                        row,
                        col,
                        CompressedRef::ColRun {
                            start: run.start,
                            end: run.end,
                        },
                    );
                }
            }
        }
    }
    fragment
}

/// Stage name used in map fragments and statistics.
pub const STAGE_NAME: &str = "anchors";

fn invert(origin: &[usize], len: usize) -> Vec<Option<usize>> {
    let mut target = vec![None; len];
    for (new_idx, &old_idx) in origin.iter().enumerate() {
        target[old_idx] = Some(new_idx);
    }
    target
}

fn run_containing(runs: &[OmittedRun], index: usize) -> OmittedRun {
    runs.iter()
        .copied()
        .find(|run| index >= run.start && index <= run.end)
        .unwrap_or(OmittedRun {
            start: index,
            end: index,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{CellValue, FormatFlags, FormatSignature, SheetMatrix};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn bold() -> FormatSignature {
        FormatSignature::from_flags(FormatFlags::BOLD)
    }

    /// 10x2 sheet: header row, numbers, then a blank gap and a second block.
    fn sectioned() -> SheetMatrix {
        let mut builder = SheetMatrix::builder("sectioned", 10, 2);
        builder.set(0, 0, text("Region"), bold());
        builder.set(0, 1, text("Total"), bold());
        for row in 1..4 {
            builder.set(row, 0, text("north"), FormatSignature::plain());
            builder.set(row, 1, CellValue::Int(row as i64), FormatSignature::plain());
        }
        // rows 4-6 blank
        builder.set(7, 0, text("Notes"), bold());
        builder.set(8, 0, text("n/a"), FormatSignature::plain());
        builder.finish().unwrap()
    }

    #[test]
    fn test_header_transition_is_anchor() {
        let extraction = extract(&sectioned(), 1).unwrap();
        let anchor_rows: Vec<usize> = extraction.anchors.rows().map(|(idx, _)| idx).collect();
        // Row 0: edge; row 1: format transition off the bold header;
        // row 7: content resumption after the blank gap.
        assert!(anchor_rows.contains(&0));
        assert!(anchor_rows.contains(&1));
        assert!(anchor_rows.contains(&7));
        let reasons: Vec<_> = extraction
            .anchors
            .rows()
            .find(|(idx, _)| *idx == 7)
            .map(|(_, r)| r.to_vec())
            .unwrap();
        assert!(reasons.contains(&AnchorReason::ContentResumption));
    }

    #[test]
    fn test_proximity_window_retention() {
        let extraction = extract(&sectioned(), 1).unwrap();
        // Anchors at 0, 1, 7, 8(?), 9-edge: window 1 keeps 0-2 and 6-9.
        assert!(extraction.row_origin.contains(&2));
        assert!(!extraction.row_origin.contains(&4));
        assert_eq!(
            extraction.omitted_rows,
            vec![OmittedRun { start: 3, end: 5 }]
        );
    }

    #[test]
    fn test_leading_blank_margin_anchors_first_content_row() {
        // Rows 0-9 blank, rows 10-19 text: row 10 resumes content after
        // the leading blank run and must anchor, keeping the content block.
        let mut builder = SheetMatrix::builder("margin", 20, 1);
        for row in 10..20 {
            builder.set(row, 0, text("body"), FormatSignature::plain());
        }
        let matrix = builder.finish().unwrap();
        let extraction = extract(&matrix, 4).unwrap();

        let reasons: Vec<_> = extraction
            .anchors
            .rows()
            .find(|(idx, _)| *idx == 10)
            .map(|(_, r)| r.to_vec())
            .expect("row 10 is an anchor");
        assert!(reasons.contains(&AnchorReason::ContentResumption));
        for row in 10..20 {
            assert!(extraction.row_origin.contains(&row), "row {row} dropped");
        }
    }

    #[test]
    fn test_retained_count_monotonic_in_proximity() {
        let matrix = sectioned();
        let mut previous = 0;
        for proximity in 0..6 {
            let extraction = extract(&matrix, proximity).unwrap();
            let count = extraction.row_origin.len() * extraction.col_origin.len();
            assert!(count >= previous, "proximity {proximity} shrank retention");
            previous = count;
        }
    }

    #[test]
    fn test_empty_matrix_collapses_to_markers() {
        let matrix = SheetMatrix::builder("blank", 5, 3).finish().unwrap();
        let extraction = extract(&matrix, 4).unwrap();
        assert!(extraction.anchors.is_empty());
        assert_eq!(extraction.matrix.rows(), 0);
        assert_eq!(
            extraction.omitted_rows,
            vec![OmittedRun { start: 0, end: 4 }]
        );
        assert_eq!(
            extraction.omitted_cols,
            vec![OmittedRun { start: 0, end: 2 }]
        );
    }

    #[test]
    fn test_uniform_matrix_keeps_edges_only() {
        let mut builder = SheetMatrix::builder("uniform", 30, 2);
        for row in 0..30 {
            builder.set(row, 0, CellValue::Int(row as i64), FormatSignature::plain());
            builder.set(row, 1, CellValue::Int(1), FormatSignature::plain());
        }
        let matrix = builder.finish().unwrap();
        let extraction = extract(&matrix, 4).unwrap();
        // No transitions anywhere: only the sheet edges anchor, so the
        // middle collapses into one run.
        assert_eq!(extraction.row_origin, vec![0, 1, 2, 3, 4, 25, 26, 27, 28, 29]);
        assert_eq!(
            extraction.omitted_rows,
            vec![OmittedRun { start: 5, end: 24 }]
        );
    }

    #[test]
    fn test_mixed_type_row_triggers_type_transition() {
        let mut builder = SheetMatrix::builder("types", 3, 2);
        builder.set(0, 0, text("label"), FormatSignature::plain());
        builder.set(0, 1, text("other"), FormatSignature::plain());
        builder.set(1, 0, text("label"), FormatSignature::plain());
        builder.set(1, 1, CellValue::Int(9), FormatSignature::plain());
        builder.set(2, 0, text("label"), FormatSignature::plain());
        builder.set(2, 1, CellValue::Int(10), FormatSignature::plain());
        let matrix = builder.finish().unwrap();
        let extraction = extract(&matrix, 0).unwrap();
        let row1: Vec<_> = extraction
            .anchors
            .rows()
            .find(|(idx, _)| *idx == 1)
            .map(|(_, r)| r.to_vec())
            .unwrap();
        assert_eq!(row1, vec![AnchorReason::TypeTransition]);
    }
}
