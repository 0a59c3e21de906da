//! The typed, formatted grid all compression stages operate on.

use super::cell::{Cell, CellValue, FormatSignature};
use crate::common::{CellRange, Error, Result};

/// A merged rectangular region with a single logical value anchored at its
/// top-left cell. Bounds are inclusive, 0-based.
pub type MergedRegion = CellRange;

/// Ordered 2D collection of [`Cell`]s plus merged regions.
///
/// Read-only to all compression stages: each stage derives a new matrix
/// rather than mutating in place.
///
/// # Examples
///
/// ```rust
/// use sheetpress::matrix::{CellValue, FormatSignature, SheetMatrix};
///
/// let mut builder = SheetMatrix::builder("Sheet1", 2, 2);
/// builder.set(0, 0, CellValue::Text("total".into()), FormatSignature::plain());
/// builder.set(0, 1, CellValue::Int(42), FormatSignature::plain());
/// let matrix = builder.finish()?;
/// assert_eq!(matrix.rows(), 2);
/// # Ok::<(), sheetpress::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SheetMatrix {
    name: String,
    rows: usize,
    cols: usize,
    /// Row-major cell storage, exactly `rows * cols` entries
    cells: Vec<Cell>,
    merged: Vec<MergedRegion>,
}

impl SheetMatrix {
    /// Start building a matrix of the given dimensions, initially all empty.
    pub fn builder(name: impl Into<String>, rows: usize, cols: usize) -> SheetMatrixBuilder {
        SheetMatrixBuilder::new(name.into(), rows, cols)
    }

    /// Assemble a matrix from parts and validate it.
    ///
    /// Returns [`Error::MalformedMatrix`] if the cell set is inconsistent
    /// with the dimensions or a merged region is out of bounds or overlaps
    /// another.
    pub fn from_parts(
        name: impl Into<String>,
        rows: usize,
        cols: usize,
        cells: Vec<Cell>,
        merged: Vec<MergedRegion>,
    ) -> Result<Self> {
        let matrix = Self {
            name: name.into(),
            rows,
            cols,
            cells,
            merged,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Sheet name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Merged regions, in ingestion order.
    #[inline]
    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged
    }

    /// Cell at a 0-based `(row, col)`, or `None` when out of bounds.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            Some(&self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Iterate over all cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Iterate over one row's cells.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &Cell> {
        let start = row * self.cols;
        self.cells[start..start + self.cols].iter()
    }

    /// Iterate over one column's cells.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> {
        (0..self.rows).map(move |r| &self.cells[r * self.cols + col])
    }

    /// Whether every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    /// Check structural invariants.
    ///
    /// Every `(row, col)` in `[0, rows) x [0, cols)` must map to exactly one
    /// cell that records its own coordinate; merged regions must be
    /// non-overlapping and fully contained within the bounds.
    pub fn validate(&self) -> Result<()> {
        if self.cells.len() != self.rows * self.cols {
            return Err(Error::MalformedMatrix(format!(
                "expected {} cells for {}x{} grid, found {}",
                self.rows * self.cols,
                self.rows,
                self.cols,
                self.cells.len()
            )));
        }
        for (i, cell) in self.cells.iter().enumerate() {
            let (row, col) = (i / self.cols.max(1), i % self.cols.max(1));
            if cell.row != row || cell.col != col {
                return Err(Error::MalformedMatrix(format!(
                    "cell at slot ({}, {}) records coordinate ({}, {})",
                    row, col, cell.row, cell.col
                )));
            }
        }
        for (i, region) in self.merged.iter().enumerate() {
            if region.row_end < region.row_start
                || region.col_end < region.col_start
                || region.row_end >= self.rows
                || region.col_end >= self.cols
            {
                return Err(Error::MalformedMatrix(format!(
                    "merged region {} out of bounds for {}x{} grid",
                    region, self.rows, self.cols
                )));
            }
            for other in &self.merged[i + 1..] {
                if region.overlaps(other) {
                    return Err(Error::MalformedMatrix(format!(
                        "merged regions {} and {} overlap",
                        region, other
                    )));
                }
            }
        }
        Ok(())
    }

    /// Derive a matrix keeping only the given rows and columns, reindexed
    /// compactly. Index slices must be strictly increasing subsets of the
    /// original axes. Merged regions are not carried over: they address the
    /// original coordinate space, which the pipeline tracks separately, and
    /// would break this matrix's bounds invariant once reindexed.
    pub(crate) fn project(&self, keep_rows: &[usize], keep_cols: &[usize]) -> Self {
        let mut cells = Vec::with_capacity(keep_rows.len() * keep_cols.len());
        for (new_row, &row) in keep_rows.iter().enumerate() {
            for (new_col, &col) in keep_cols.iter().enumerate() {
                let source = &self.cells[row * self.cols + col];
                cells.push(Cell::new(
                    new_row,
                    new_col,
                    source.value.clone(),
                    source.format,
                ));
            }
        }
        Self {
            name: self.name.clone(),
            rows: keep_rows.len(),
            cols: keep_cols.len(),
            cells,
            merged: Vec::new(),
        }
    }

    /// Replace one cell's value in place. Internal to stage construction;
    /// stages never mutate their *input* matrix.
    pub(crate) fn set_value(&mut self, row: usize, col: usize, value: CellValue) {
        let cols = self.cols;
        let cell = &mut self.cells[row * cols + col];
        *cell = Cell::new(row, col, value, cell.format);
    }
}

/// Incremental constructor for [`SheetMatrix`].
///
/// Starts from an all-empty grid; `set` fills individual cells. `finish`
/// validates the result.
#[derive(Debug)]
pub struct SheetMatrixBuilder {
    name: String,
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    merged: Vec<MergedRegion>,
}

impl SheetMatrixBuilder {
    fn new(name: String, rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::empty(row, col));
            }
        }
        Self {
            name,
            rows,
            cols,
            cells,
            merged: Vec::new(),
        }
    }

    /// Set a cell's value and format. Out-of-bounds coordinates are ignored;
    /// `finish` still validates the assembled grid.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue, format: FormatSignature) {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = Cell::new(row, col, value, format);
        }
    }

    /// Attach a merged region (inclusive bounds, 0-based).
    pub fn merge(&mut self, region: MergedRegion) {
        self.merged.push(region);
    }

    /// Validate and produce the matrix.
    pub fn finish(self) -> Result<SheetMatrix> {
        SheetMatrix::from_parts(self.name, self.rows, self.cols, self.cells, self.merged)
    }
}
