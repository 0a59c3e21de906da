//! Inverted-index translation of repeated values.
//!
//! Cells sharing a `(type, canonical value)` key are clustered; the first
//! occurrence stays in place and later occurrences become reference tokens
//! pointing at a [`ValueIndex`] entry, whose coordinates are compacted into
//! row-major runs.

use super::coordmap::{CompressedRef, MapFragment};
use crate::matrix::{CellValue, DataType, SheetMatrix};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Stage name used in map fragments and statistics.
pub const STAGE_NAME: &str = "inverted-index";

/// Canonical textual form of a cell's value, used as the grouping key.
///
/// Numbers render through itoa/ryu with trailing-zero normalization
/// (`2.0` -> `2`, `1.50` -> `1.5`); text is whitespace-trimmed; dates use
/// ISO forms. Returns `None` for empty cells and reference tokens, which
/// never participate in grouping.
pub fn canonical_value(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Empty | CellValue::IndexRef(_) => None,
        CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        CellValue::Int(i) => {
            let mut buf = itoa::Buffer::new();
            Some(buf.format(*i).to_string())
        }
        CellValue::Float(f) => Some(canonical_float(*f)),
        CellValue::Text(s) => Some(s.trim().to_string()),
        CellValue::DateTime(dt) => {
            let formatted = if dt.time() == chrono::NaiveTime::MIN {
                dt.format("%Y-%m-%d")
            } else {
                dt.format("%Y-%m-%d %H:%M:%S")
            };
            Some(formatted.to_string())
        }
    }
}

fn canonical_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        let mut buf = itoa::Buffer::new();
        buf.format(f as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(f).to_string()
    }
}

/// A row-major run of consecutive addresses on one row, compressed-space
/// coordinates, inclusive columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressRun {
    /// Row the run sits on
    pub row: usize,
    /// First column (inclusive)
    pub col_start: usize,
    /// Last column (inclusive)
    pub col_end: usize,
}

impl std::fmt::Display for AddressRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = crate::common::format_address(self.row, self.col_start);
        if self.col_start == self.col_end {
            f.write_str(&start)
        } else {
            write!(
                f,
                "{}:{}",
                start,
                crate::common::format_address(self.row, self.col_end)
            )
        }
    }
}

/// One cluster of cells sharing a `(type, canonical value)` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueIndexEntry {
    /// Entry id, referenced by `CellValue::IndexRef` tokens
    pub id: u32,
    /// Coarse type of every member; never mixed
    pub data_type: DataType,
    /// The shared canonical value
    pub canonical: String,
    /// Member coordinates as minimal row-major runs
    pub runs: SmallVec<[AddressRun; 4]>,
}

impl ValueIndexEntry {
    /// Total number of member cells.
    pub fn member_count(&self) -> usize {
        self.runs
            .iter()
            .map(|run| run.col_end - run.col_start + 1)
            .sum()
    }

    /// Iterate over all member coordinates, row-major.
    pub fn members(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.runs
            .iter()
            .flat_map(|run| (run.col_start..=run.col_end).map(move |col| (run.row, col)))
    }
}

/// The full value index produced by one translation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueIndex {
    entries: Vec<ValueIndexEntry>,
}

impl ValueIndex {
    /// All entries, in order of first occurrence.
    #[inline]
    pub fn entries(&self) -> &[ValueIndexEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    #[inline]
    pub fn entry(&self, id: u32) -> Option<&ValueIndexEntry> {
        self.entries.get(id as usize)
    }

    /// Whether no values repeated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of the inverted-index stage.
#[derive(Debug)]
pub struct IndexTranslation {
    /// Residual matrix: first occurrences in place, repeats as `IndexRef`s
    pub matrix: SheetMatrix,
    /// The value index
    pub index: ValueIndex,
    /// Coordinate-map fragment (identity except for rewritten repeats)
    pub fragment: MapFragment,
}

/// Cluster repeated values and rewrite their repeats as reference tokens.
///
/// Clusters of size 1 are left untouched so index overhead never exceeds
/// the savings. Canonicalization never merges values across types: numeric
/// `0.5` and text `"0.5"` form distinct clusters.
pub fn translate(matrix: &SheetMatrix) -> IndexTranslation {
    // Group row-major so entry ids and run lists are deterministic.
    let mut groups: HashMap<(DataType, String), Vec<(usize, usize)>> = HashMap::new();
    let mut order: Vec<(DataType, String)> = Vec::new();
    for cell in matrix.cells() {
        let Some(canonical) = canonical_value(&cell.value) else {
            continue;
        };
        let key = (cell.data_type, canonical);
        match groups.get_mut(&key) {
            Some(members) => members.push((cell.row, cell.col)),
            None => {
                groups.insert(key.clone(), vec![(cell.row, cell.col)]);
                order.push(key);
            }
        }
    }

    let mut residual = matrix.clone();
    let mut fragment = MapFragment::identity(STAGE_NAME, matrix.rows(), matrix.cols());
    let mut entries = Vec::new();

    for key in order {
        let members = &groups[&key];
        if members.len() < 2 {
            continue;
        }
        let id = entries.len() as u32;
        let (data_type, canonical) = key;
        // First occurrence stays in place; repeats become reference tokens.
        for &(row, col) in &members[1..] {
            residual.set_value(row, col, CellValue::IndexRef(id));
            fragment.redirect(row, col, CompressedRef::IndexEntry(id));
        }
        entries.push(ValueIndexEntry {
            id,
            data_type,
            canonical,
            runs: compact_runs(members),
        });
    }

    IndexTranslation {
        matrix: residual,
        index: ValueIndex { entries },
        fragment,
    }
}

/// Collapse row-major sorted coordinates into minimal contiguous runs.
/// Non-contiguous coordinates stay as their own single-cell runs.
fn compact_runs(members: &[(usize, usize)]) -> SmallVec<[AddressRun; 4]> {
    let mut runs: SmallVec<[AddressRun; 4]> = SmallVec::new();
    for &(row, col) in members {
        match runs.last_mut() {
            Some(last) if last.row == row && last.col_end + 1 == col => {
                last.col_end = col;
            }
            _ => runs.push(AddressRun {
                row,
                col_start: col,
                col_end: col,
            }),
        }
    }
    runs
}

/// Write every entry's canonical value back to its member coordinates.
///
/// Used to check index faithfulness: the result must reproduce the original
/// canonical values exactly.
pub fn expand_entry(entry: &ValueIndexEntry) -> impl Iterator<Item = ((usize, usize), &str)> {
    entry
        .members()
        .map(move |coord| (coord, entry.canonical.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{FormatSignature, SheetMatrix};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_canonical_normalizes_numbers() {
        assert_eq!(canonical_value(&CellValue::Float(2.0)).unwrap(), "2");
        assert_eq!(canonical_value(&CellValue::Float(1.5)).unwrap(), "1.5");
        assert_eq!(canonical_value(&CellValue::Int(-7)).unwrap(), "-7");
        assert_eq!(canonical_value(&text("  padded  ")).unwrap(), "padded");
        assert_eq!(canonical_value(&CellValue::Empty), None);
    }

    #[test]
    fn test_types_never_conflate() {
        let mut builder = SheetMatrix::builder("mixed", 1, 2);
        builder.set(0, 0, CellValue::Float(0.5), FormatSignature::plain());
        builder.set(0, 1, text("0.5"), FormatSignature::plain());
        let matrix = builder.finish().unwrap();
        // Same canonical text, different types: no cluster forms.
        let translation = translate(&matrix);
        assert!(translation.index.is_empty());
        assert_eq!(translation.matrix, matrix);
    }

    #[test]
    fn test_first_occurrence_stays_in_place() {
        let mut builder = SheetMatrix::builder("repeats", 2, 2);
        builder.set(0, 0, text("Revenue"), FormatSignature::plain());
        builder.set(0, 1, text("Cost"), FormatSignature::plain());
        builder.set(1, 0, text("Revenue"), FormatSignature::plain());
        builder.set(1, 1, text("Revenue"), FormatSignature::plain());
        let matrix = builder.finish().unwrap();

        let translation = translate(&matrix);
        assert_eq!(translation.index.entries().len(), 1);
        let entry = translation.index.entry(0).unwrap();
        assert_eq!(entry.canonical, "Revenue");
        assert_eq!(entry.member_count(), 3);

        // "Cost" repeats nowhere: untouched.
        assert_eq!(translation.matrix.cell(0, 1).unwrap().value, text("Cost"));
        // First "Revenue" stays; the other two become references.
        assert_eq!(
            translation.matrix.cell(0, 0).unwrap().value,
            text("Revenue")
        );
        assert_eq!(
            translation.matrix.cell(1, 0).unwrap().value,
            CellValue::IndexRef(0)
        );
        assert_eq!(
            translation.matrix.cell(1, 1).unwrap().value,
            CellValue::IndexRef(0)
        );
    }

    #[test]
    fn test_contiguous_members_compact_into_runs() {
        let mut builder = SheetMatrix::builder("runs", 1, 4);
        for col in 0..3 {
            builder.set(0, col, text("x"), FormatSignature::plain());
        }
        builder.set(0, 3, text("y"), FormatSignature::plain());
        let matrix = builder.finish().unwrap();
        let translation = translate(&matrix);
        let entry = translation.index.entry(0).unwrap();
        assert_eq!(
            entry.runs.as_slice(),
            &[AddressRun {
                row: 0,
                col_start: 0,
                col_end: 2
            }]
        );
        assert_eq!(entry.runs[0].to_string(), "A1:C1");
    }

    #[test]
    fn test_noncontiguous_members_stay_discrete() {
        // "Revenue" at rows 3, 7, 12 of one column: three discrete runs,
        // never a falsely merged range.
        let mut builder = SheetMatrix::builder("revenue", 13, 1);
        for row in [3, 7, 12] {
            builder.set(row, 0, text("Revenue"), FormatSignature::plain());
        }
        let matrix = builder.finish().unwrap();
        let translation = translate(&matrix);
        let entry = translation.index.entry(0).unwrap();
        assert_eq!(entry.runs.len(), 3);
        let addresses: Vec<String> = entry.runs.iter().map(|r| r.to_string()).collect();
        assert_eq!(addresses, vec!["A4", "A8", "A13"]);
    }

    #[test]
    fn test_expansion_reproduces_original_values() {
        let mut builder = SheetMatrix::builder("faithful", 3, 2);
        builder.set(0, 0, CellValue::Float(2.0), FormatSignature::plain());
        builder.set(1, 0, CellValue::Int(2), FormatSignature::plain());
        builder.set(2, 1, CellValue::Float(2.00), FormatSignature::plain());
        let matrix = builder.finish().unwrap();
        let translation = translate(&matrix);

        for entry in translation.index.entries() {
            for ((row, col), canonical) in expand_entry(entry) {
                let original = matrix.cell(row, col).unwrap();
                assert_eq!(canonical_value(&original.value).unwrap(), canonical);
                assert_eq!(original.data_type, entry.data_type);
            }
        }
    }
}
