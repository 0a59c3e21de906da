//! Bidirectional mapping between original and compressed coordinate spaces.
//!
//! Every lossy stage emits a [`MapFragment`] describing what it did to the
//! coordinates it was given; [`CoordinateMap::compose`] folds that fragment
//! into the map threaded through the pipeline. The composed map always
//! answers two questions: where did an original cell end up, and which
//! original cells does a compressed artifact stand for.

use crate::common::{Error, Result, column_letter, format_address};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a compressed-space element.
///
/// `Cell` addresses the compressed grid; `RowRun`/`ColRun` are omitted-run
/// markers carrying *original* bounds; `IndexEntry` points at a value-index
/// entry by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedRef {
    /// A single cell in the compressed grid
    Cell(usize, usize),
    /// A contiguous run of omitted rows, original bounds inclusive
    RowRun {
        /// First omitted row
        start: usize,
        /// Last omitted row
        end: usize,
    },
    /// A contiguous run of omitted columns, original bounds inclusive
    ColRun {
        /// First omitted column
        start: usize,
        /// Last omitted column
        end: usize,
    },
    /// A value-index entry
    IndexEntry(u32),
}

impl CompressedRef {
    /// Whether the reference addresses surviving content (a compressed cell
    /// or an index entry), as opposed to an omitted-run marker.
    #[inline]
    pub fn is_retained(&self) -> bool {
        matches!(self, CompressedRef::Cell(..) | CompressedRef::IndexEntry(_))
    }
}

impl fmt::Display for CompressedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressedRef::Cell(row, col) => f.write_str(&format_address(*row, *col)),
            CompressedRef::RowRun { start, end } => write!(f, "rows {}-{}", start + 1, end + 1),
            CompressedRef::ColRun { start, end } => {
                write!(f, "cols {}-{}", column_letter(*start), column_letter(*end))
            }
            CompressedRef::IndexEntry(id) => write!(f, "@{}", id),
        }
    }
}

/// One stage's effect on the coordinate space it received.
///
/// Keys are cells of the *previous* compressed space; values say where each
/// went. A stage that drops nothing still lists every cell (identity
/// entries), so composition can detect accidental coordinate loss.
#[derive(Debug, Clone)]
pub struct MapFragment {
    stage: &'static str,
    entries: HashMap<(usize, usize), CompressedRef>,
}

impl MapFragment {
    /// Start an empty fragment for the named stage.
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            entries: HashMap::new(),
        }
    }

    /// Name of the stage that produced this fragment.
    #[inline]
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Record that a cell survived at a new compressed coordinate.
    pub fn retain(&mut self, prev_row: usize, prev_col: usize, new_row: usize, new_col: usize) {
        self.entries
            .insert((prev_row, prev_col), CompressedRef::Cell(new_row, new_col));
    }

    /// Record that a cell was redirected to a marker or index entry.
    pub fn redirect(&mut self, prev_row: usize, prev_col: usize, target: CompressedRef) {
        self.entries.insert((prev_row, prev_col), target);
    }

    /// Build an identity fragment over a grid of the given dimensions.
    pub fn identity(stage: &'static str, rows: usize, cols: usize) -> Self {
        let mut fragment = Self::new(stage);
        for row in 0..rows {
            for col in 0..cols {
                fragment.retain(row, col, row, col);
            }
        }
        fragment
    }

    fn lookup(&self, row: usize, col: usize) -> Option<&CompressedRef> {
        self.entries.get(&(row, col))
    }
}

/// The composed original-to-compressed relation threaded through the
/// pipeline.
///
/// Many originals may share one compressed reference (runs, index entries),
/// but every live reference resolves back to a non-empty original set, and
/// resolution is never ambiguous.
#[derive(Debug, Clone)]
pub struct CoordinateMap {
    forward: HashMap<(usize, usize), CompressedRef>,
    reverse: HashMap<CompressedRef, Vec<(usize, usize)>>,
}

impl CoordinateMap {
    /// Identity map over an uncompressed grid.
    pub fn identity(rows: usize, cols: usize) -> Self {
        let mut forward = HashMap::with_capacity(rows * cols);
        let mut reverse = HashMap::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let reference = CompressedRef::Cell(row, col);
                forward.insert((row, col), reference);
                reverse.insert(reference, vec![(row, col)]);
            }
        }
        Self { forward, reverse }
    }

    /// All original coordinates a compressed reference stands for.
    ///
    /// Empty only for references that are not part of this map.
    pub fn original_of(&self, reference: &CompressedRef) -> &[(usize, usize)] {
        self.reverse
            .get(reference)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Where an original coordinate ended up.
    ///
    /// Omitted cells resolve to their run marker; `None` means the
    /// coordinate was never part of the original grid.
    pub fn compressed_of(&self, row: usize, col: usize) -> Option<&CompressedRef> {
        self.forward.get(&(row, col))
    }

    /// Whether an original coordinate survived into the compressed output
    /// (directly or through an index entry).
    pub fn is_retained(&self, row: usize, col: usize) -> bool {
        self.compressed_of(row, col)
            .is_some_and(CompressedRef::is_retained)
    }

    /// Iterate over all `(original, compressed)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&(usize, usize), &CompressedRef)> {
        self.forward.iter()
    }

    /// Fold one stage's fragment into the map.
    ///
    /// Cells of the previous compressed space are pushed through the
    /// fragment; markers and index entries pass through untouched. Fails
    /// with [`Error::CoordinateDrift`] naming the stage if the fragment
    /// loses a coordinate or the composed map no longer round-trips.
    pub fn compose(&self, fragment: &MapFragment) -> Result<Self> {
        let mut forward = HashMap::with_capacity(self.forward.len());
        let mut reverse: HashMap<CompressedRef, Vec<(usize, usize)>> = HashMap::new();

        for (&original, previous) in &self.forward {
            let next = match previous {
                CompressedRef::Cell(row, col) => {
                    *fragment
                        .lookup(*row, *col)
                        .ok_or(Error::CoordinateDrift {
                            stage: fragment.stage,
                            row: original.0,
                            col: original.1,
                        })?
                }
                passthrough => *passthrough,
            };
            forward.insert(original, next);
            reverse.entry(next).or_default().push(original);
        }

        for originals in reverse.values_mut() {
            originals.sort_unstable();
        }

        let composed = Self { forward, reverse };
        composed.verify_round_trip(fragment.stage)?;
        Ok(composed)
    }

    /// Check that every original coordinate resolves back through its
    /// compressed reference.
    fn verify_round_trip(&self, stage: &'static str) -> Result<()> {
        for (&(row, col), reference) in &self.forward {
            let originals = self.original_of(reference);
            if originals.binary_search(&(row, col)).is_err() {
                return Err(Error::CoordinateDrift { stage, row, col });
            }
        }
        Ok(())
    }
}
