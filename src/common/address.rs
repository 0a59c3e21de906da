//! A1-style cell addressing.
//!
//! All pipeline coordinates are 0-based `(row, col)` pairs; this module
//! converts between those and the familiar `A1` / `B2:D2` textual forms used
//! in the encoded output.

use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Convert a 0-based column index to its letter form (0 -> "A", 26 -> "AA").
pub fn column_letter(col: usize) -> String {
    let mut idx = col + 1;
    let mut out = String::new();
    while idx > 0 {
        let rem = (idx - 1) % 26;
        out.insert(0, (b'A' + rem as u8) as char);
        idx = (idx - 1) / 26;
    }
    out
}

/// Convert a column letter form to its 0-based index ("A" -> 0, "AA" -> 26).
pub fn column_index(letters: &str) -> Result<usize> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress(letters.to_string()));
    }
    let mut idx = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(letters.to_string()));
        }
        idx = idx * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Ok(idx - 1)
}

/// Format a 0-based `(row, col)` pair as an A1 address ((0, 0) -> "A1").
pub fn format_address(row: usize, col: usize) -> String {
    let mut buf = itoa::Buffer::new();
    let mut out = column_letter(col);
    out.push_str(buf.format(row + 1));
    out
}

/// Parse an A1 address into a 0-based `(row, col)` pair ("A1" -> (0, 0)).
pub fn parse_address(address: &str) -> Result<(usize, usize)> {
    let split = address
        .chars()
        .position(|c| c.is_ascii_digit())
        .ok_or_else(|| Error::InvalidAddress(address.to_string()))?;
    let (letters, digits) = address.split_at(split);
    if letters.is_empty() || digits.is_empty() {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    let col = column_index(letters)?;
    let row: usize = digits
        .parse()
        .map_err(|_| Error::InvalidAddress(address.to_string()))?;
    if row == 0 {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    Ok((row - 1, col))
}

/// Inclusive rectangular cell range in 0-based coordinates.
///
/// Displays as a single address when it covers one cell, and as
/// `A1:B2` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    /// First row (inclusive)
    pub row_start: usize,
    /// Last row (inclusive)
    pub row_end: usize,
    /// First column (inclusive)
    pub col_start: usize,
    /// Last column (inclusive)
    pub col_end: usize,
}

impl CellRange {
    /// Create a range covering a single cell.
    #[inline]
    pub const fn cell(row: usize, col: usize) -> Self {
        Self {
            row_start: row,
            row_end: row,
            col_start: col,
            col_end: col,
        }
    }

    /// Number of cells covered by the range.
    #[inline]
    pub const fn len(&self) -> usize {
        (self.row_end - self.row_start + 1) * (self.col_end - self.col_start + 1)
    }

    /// Whether the range covers no cells. Ranges are inclusive, so this is
    /// always false for a well-formed range.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether the range contains the given 0-based coordinate.
    #[inline]
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row_start && row <= self.row_end && col >= self.col_start && col <= self.col_end
    }

    /// Whether two ranges share at least one cell.
    pub const fn overlaps(&self, other: &CellRange) -> bool {
        self.row_start <= other.row_end
            && other.row_start <= self.row_end
            && self.col_start <= other.col_end
            && other.col_start <= self.col_end
    }

    /// Iterate over all `(row, col)` coordinates in the range, row-major.
    pub fn coordinates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row_start..=self.row_end)
            .flat_map(move |r| (self.col_start..=self.col_end).map(move |c| (r, c)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = format_address(self.row_start, self.col_start);
        if self.row_start == self.row_end && self.col_start == self.col_end {
            f.write_str(&start)
        } else {
            write!(f, "{}:{}", start, format_address(self.row_end, self.col_end))
        }
    }
}
