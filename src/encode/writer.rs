//! Low-level writer for the layered text encoding.
//!
//! The encoding is line-oriented and deliberately stable: header, omitted
//! markers, value layer, value index, format layer, merged regions. Every
//! address token in the Values/Formats sections is a compressed-space
//! address resolvable through the coordinate map; Omitted and Merged
//! sections speak original coordinates.

use crate::common::{CellRange, column_letter, format_address};
use crate::compress::aggregate::FormatBlock;
use crate::compress::anchor::OmittedRun;
use crate::compress::index::{ValueIndex, canonical_value};
use crate::matrix::{CellValue, FormatSignature, SheetMatrix};
use std::fmt::Write as FmtWrite;

/// Everything the encoder needs to serialize one pipeline result.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EncodeInput<'a> {
    /// Sheet name
    pub name: &'a str,
    /// Original (pre-compression) row count
    pub original_rows: usize,
    /// Original (pre-compression) column count
    pub original_cols: usize,
    /// Matrix after the final enabled stage
    pub matrix: &'a SheetMatrix,
    /// Dropped row runs, original coordinates
    pub omitted_rows: &'a [OmittedRun],
    /// Dropped column runs, original coordinates
    pub omitted_cols: &'a [OmittedRun],
    /// Value index, when the inverted-index stage ran
    pub index: Option<&'a ValueIndex>,
    /// Format blocks, when the aggregation stage ran
    pub blocks: Option<&'a [FormatBlock]>,
    /// Merged regions of the original sheet
    pub merged: &'a [CellRange],
}

/// Serialize a pipeline result into the layered text form.
pub(crate) fn encode(input: &EncodeInput<'_>) -> String {
    let mut writer = EncodingWriter::new();
    writer.write_header(input);
    writer.write_omitted(input);
    writer.write_values(input.matrix);
    if let Some(index) = input.index {
        writer.write_index(index);
    }
    writer.write_formats(input);
    writer.write_merged(input.merged);
    writer.finish()
}

/// Buffer-backed writer; one method per section.
struct EncodingWriter {
    buffer: String,
}

impl EncodingWriter {
    fn new() -> Self {
        Self {
            buffer: String::with_capacity(4096),
        }
    }

    fn write_header(&mut self, input: &EncodeInput<'_>) {
        let _ = write!(
            self.buffer,
            "# Sheet: {}\nDimensions: {}x{}\n",
            input.name, input.original_rows, input.original_cols
        );
    }

    fn write_omitted(&mut self, input: &EncodeInput<'_>) {
        // A fully collapsed sheet keeps only its row markers; column
        // markers would not resolve through the map in that case.
        let fully_collapsed = input.matrix.rows() == 0 || input.matrix.cols() == 0;
        if input.omitted_rows.is_empty() && (fully_collapsed || input.omitted_cols.is_empty()) {
            return;
        }
        self.buffer.push_str("\n## Omitted\n");
        for run in input.omitted_rows {
            let _ = writeln!(
                self.buffer,
                "rows {}-{} ({} omitted)",
                run.start + 1,
                run.end + 1,
                run.len()
            );
        }
        if !fully_collapsed {
            for run in input.omitted_cols {
                let _ = writeln!(
                    self.buffer,
                    "cols {}-{} ({} omitted)",
                    column_letter(run.start),
                    column_letter(run.end),
                    run.len()
                );
            }
        }
    }

    fn write_values(&mut self, matrix: &SheetMatrix) {
        self.buffer.push_str("\n## Values\n");
        for row in 0..matrix.rows() {
            let mut first = true;
            for cell in matrix.row(row) {
                let rendered = match &cell.value {
                    CellValue::IndexRef(id) => format!("@{}", id),
                    value => match canonical_value(value) {
                        Some(text) => text,
                        None => continue,
                    },
                };
                if first {
                    first = false;
                } else {
                    self.buffer.push_str(" | ");
                }
                let _ = write!(self.buffer, "{}: {}", cell.address(), rendered);
            }
            if !first {
                self.buffer.push('\n');
            }
        }
    }

    fn write_index(&mut self, index: &ValueIndex) {
        if index.is_empty() {
            return;
        }
        self.buffer.push_str("\n## Value Index\n");
        for entry in index.entries() {
            let _ = write!(
                self.buffer,
                "@{} {} {}:",
                entry.id, entry.data_type, entry.canonical
            );
            for (i, run) in entry.runs.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                let _ = write!(self.buffer, "{}{}", sep, run);
            }
            self.buffer.push('\n');
        }
    }

    fn write_formats(&mut self, input: &EncodeInput<'_>) {
        match input.blocks {
            Some(blocks) => self.write_block_formats(blocks),
            None => self.write_cell_formats(input.matrix),
        }
    }

    /// Aggregated form: every block appears, unstyled ones included, so the
    /// section partitions the grid.
    fn write_block_formats(&mut self, blocks: &[FormatBlock]) {
        if blocks.is_empty() {
            return;
        }
        self.buffer.push_str("\n## Formats\n");
        let mut groups: Vec<(FormatSignature, Vec<CellRange>)> = Vec::new();
        for block in blocks {
            match groups.iter_mut().find(|(sig, _)| *sig == block.signature) {
                Some((_, ranges)) => ranges.push(block.range),
                None => groups.push((block.signature, vec![block.range])),
            }
        }
        for (signature, ranges) in groups {
            let _ = write!(self.buffer, "{}:", signature);
            for (i, range) in ranges.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                let _ = write!(self.buffer, "{}{}", sep, range);
            }
            self.buffer.push('\n');
        }
    }

    /// Unaggregated form: only styled cells are listed, grouped by
    /// signature in order of first appearance.
    fn write_cell_formats(&mut self, matrix: &SheetMatrix) {
        let mut groups: Vec<(FormatSignature, Vec<String>)> = Vec::new();
        for cell in matrix.cells() {
            if cell.format.is_plain() {
                continue;
            }
            let address = format_address(cell.row, cell.col);
            match groups.iter_mut().find(|(sig, _)| *sig == cell.format) {
                Some((_, addresses)) => addresses.push(address),
                None => groups.push((cell.format, vec![address])),
            }
        }
        if groups.is_empty() {
            return;
        }
        self.buffer.push_str("\n## Formats\n");
        for (signature, addresses) in groups {
            let _ = write!(self.buffer, "{}: {}", signature, addresses.join(", "));
            self.buffer.push('\n');
        }
    }

    fn write_merged(&mut self, merged: &[CellRange]) {
        if merged.is_empty() {
            return;
        }
        self.buffer.push_str("\n## Merged\n");
        let rendered: Vec<String> = merged
            .iter()
            .map(|region| {
                format!(
                    "{}:{}",
                    format_address(region.row_start, region.col_start),
                    format_address(region.row_end, region.col_end)
                )
            })
            .collect();
        self.buffer.push_str(&rendered.join(", "));
        self.buffer.push('\n');
    }

    fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{CellValue, FormatFlags, FormatSignature, SheetMatrix};

    fn encode_simple(matrix: &SheetMatrix) -> String {
        encode(&EncodeInput {
            name: matrix.name(),
            original_rows: matrix.rows(),
            original_cols: matrix.cols(),
            matrix,
            omitted_rows: &[],
            omitted_cols: &[],
            index: None,
            blocks: None,
            merged: matrix.merged_regions(),
        })
    }

    #[test]
    fn test_header_and_values_layout() {
        let mut builder = SheetMatrix::builder("Report", 2, 2);
        builder.set(0, 0, CellValue::Text("Total".into()), FormatSignature::plain());
        builder.set(0, 1, CellValue::Int(42), FormatSignature::plain());
        let matrix = builder.finish().unwrap();

        let text = encode_simple(&matrix);
        assert!(text.starts_with("# Sheet: Report\nDimensions: 2x2\n"));
        assert!(text.contains("## Values\nA1: Total | B1: 42\n"));
        assert!(!text.contains("## Formats"));
        assert!(!text.contains("## Merged"));
    }

    #[test]
    fn test_styled_cells_grouped_by_signature() {
        let bold = FormatSignature::from_flags(FormatFlags::BOLD);
        let mut builder = SheetMatrix::builder("styled", 1, 3);
        builder.set(0, 0, CellValue::Int(1), bold);
        builder.set(0, 2, CellValue::Int(2), bold);
        let matrix = builder.finish().unwrap();

        let text = encode_simple(&matrix);
        assert!(text.contains("## Formats\nBOLD: A1, C1\n"));
    }

    #[test]
    fn test_merged_regions_use_original_coordinates() {
        let mut builder = SheetMatrix::builder("merged", 2, 2);
        builder.set(0, 0, CellValue::Text("span".into()), FormatSignature::plain());
        builder.merge(CellRange {
            row_start: 0,
            row_end: 0,
            col_start: 0,
            col_end: 1,
        });
        let matrix = builder.finish().unwrap();

        let text = encode_simple(&matrix);
        assert!(text.contains("## Merged\nA1:B1\n"));
    }
}
