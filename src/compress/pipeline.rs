//! Pipeline orchestration: stage sequencing, statistics, encoding.
//!
//! Stages run in a fixed order — anchors, inverted index, format
//! aggregation — each consuming its predecessor's matrix and composing its
//! coordinate-map fragment. Any stage failure aborts the sheet with the
//! input untouched; token counting is advisory and never aborts.

use super::aggregate::{self, FormatBlock};
use super::anchor::{self, OmittedRun};
use super::config::CompressorOptions;
use super::coordmap::CoordinateMap;
use super::index::{self, ValueIndex};
use crate::common::Result;
use crate::encode::{EncodeInput, encode};
use crate::matrix::{HeuristicTokenCounter, SheetMatrix, TokenCounter};
use rayon::prelude::*;
use serde::Serialize;

/// Token count and ratio after one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStats {
    /// Stage name
    pub stage: &'static str,
    /// Tokens in the encoding as it stood after this stage
    pub tokens: usize,
    /// `tokens` relative to the pre-compression count
    pub ratio: f64,
}

/// Before/after token statistics for one compressed sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    /// Tokens in the uncompressed encoding
    pub original_tokens: usize,
    /// Tokens in the final encoding
    pub compressed_tokens: usize,
    /// `compressed_tokens / original_tokens`
    pub ratio: f64,
    /// Per-stage counts, in execution order
    pub stages: Vec<StageStats>,
    /// Advisory budget carried from the options; never enforced
    pub max_tokens: usize,
}

/// Output of one sheet's pipeline run.
///
/// Intermediate artifacts (anchor sets, the value index, format blocks) are
/// scoped to the run; what survives is the text, the composed coordinate
/// map, and the statistics.
#[derive(Debug)]
pub struct CompressedSheet {
    /// Sheet name
    pub name: String,
    /// The layered text encoding
    pub text: String,
    /// Composed original-to-compressed coordinate map
    pub map: CoordinateMap,
    /// Token statistics; `None` when the token counter was unavailable
    pub stats: Option<CompressionStats>,
}

/// The compression pipeline: configure once, run per sheet.
///
/// # Examples
///
/// ```rust
/// use sheetpress::compress::{CompressorOptions, SheetCompressor};
/// use sheetpress::matrix::{CellValue, FormatSignature, SheetMatrix};
///
/// let mut builder = SheetMatrix::builder("Sheet1", 2, 2);
/// builder.set(0, 0, CellValue::Text("Total".into()), FormatSignature::plain());
/// let matrix = builder.finish()?;
///
/// let compressor = SheetCompressor::new(CompressorOptions::default());
/// let compressed = compressor.compress(&matrix)?;
/// assert!(compressed.text.contains("Total"));
/// # Ok::<(), sheetpress::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SheetCompressor {
    options: CompressorOptions,
}

impl SheetCompressor {
    /// Create a compressor with the given options.
    pub fn new(options: CompressorOptions) -> Self {
        Self { options }
    }

    /// The configured options.
    #[inline]
    pub fn options(&self) -> &CompressorOptions {
        &self.options
    }

    /// Compress one sheet, counting tokens with the built-in heuristic
    /// counter.
    pub fn compress(&self, matrix: &SheetMatrix) -> Result<CompressedSheet> {
        self.compress_with_counter(matrix, &HeuristicTokenCounter)
    }

    /// Compress one sheet, counting tokens with the given collaborator.
    ///
    /// The counter is consulted only after the text exists; a failing
    /// counter yields `stats: None` rather than an error.
    pub fn compress_with_counter<C: TokenCounter + ?Sized>(
        &self,
        matrix: &SheetMatrix,
        counter: &C,
    ) -> Result<CompressedSheet> {
        matrix.validate()?;

        let original_rows = matrix.rows();
        let original_cols = matrix.cols();
        let merged = matrix.merged_regions().to_vec();

        let mut current = matrix.clone();
        let mut map = CoordinateMap::identity(original_rows, original_cols);
        let mut omitted_rows: Vec<OmittedRun> = Vec::new();
        let mut omitted_cols: Vec<OmittedRun> = Vec::new();
        let mut value_index: Option<ValueIndex> = None;
        let mut blocks: Option<Vec<FormatBlock>> = None;
        let mut stage_texts: Vec<(&'static str, String)> = Vec::new();

        let snapshot = |current: &SheetMatrix,
                        omitted_rows: &[OmittedRun],
                        omitted_cols: &[OmittedRun],
                        value_index: &Option<ValueIndex>,
                        blocks: &Option<Vec<FormatBlock>>| {
            encode(&EncodeInput {
                name: matrix.name(),
                original_rows,
                original_cols,
                matrix: current,
                omitted_rows,
                omitted_cols,
                index: value_index.as_ref(),
                blocks: blocks.as_deref(),
                merged: &merged,
            })
        };

        let original_text = snapshot(&current, &[], &[], &None, &None);

        if self.options.enable_anchors {
            let extraction = anchor::extract(&current, self.options.anchor_proximity)?;
            map = map.compose(&extraction.fragment)?;
            current = extraction.matrix;
            omitted_rows = extraction.omitted_rows;
            omitted_cols = extraction.omitted_cols;
            stage_texts.push((
                anchor::STAGE_NAME,
                snapshot(&current, &omitted_rows, &omitted_cols, &None, &None),
            ));
        }

        if self.options.enable_inverted_index {
            let translation = index::translate(&current);
            map = map.compose(&translation.fragment)?;
            current = translation.matrix;
            value_index = Some(translation.index);
            stage_texts.push((
                index::STAGE_NAME,
                snapshot(&current, &omitted_rows, &omitted_cols, &value_index, &None),
            ));
        }

        if self.options.enable_format_aggregation {
            blocks = Some(aggregate::aggregate(&current));
            stage_texts.push((
                aggregate::STAGE_NAME,
                snapshot(&current, &omitted_rows, &omitted_cols, &value_index, &blocks),
            ));
        }

        let text = match stage_texts.last() {
            Some((_, last)) => last.clone(),
            None => original_text.clone(),
        };

        let stats = self.collect_stats(counter, &original_text, &text, &stage_texts);

        Ok(CompressedSheet {
            name: matrix.name().to_string(),
            text,
            map,
            stats,
        })
    }

    /// Compress every sheet of a workbook.
    ///
    /// Sheets are independent and processed in parallel; each result stands
    /// alone, so one malformed sheet never disturbs the others. Result
    /// order follows input order.
    pub fn compress_workbook<C: TokenCounter + Sync + ?Sized>(
        &self,
        sheets: &[SheetMatrix],
        counter: &C,
    ) -> Vec<Result<CompressedSheet>> {
        sheets
            .par_iter()
            .map(|sheet| self.compress_with_counter(sheet, counter))
            .collect()
    }

    /// Count tokens for the original, final, and per-stage encodings.
    /// Any counter failure downgrades the whole record to `None`.
    fn collect_stats<C: TokenCounter + ?Sized>(
        &self,
        counter: &C,
        original_text: &str,
        final_text: &str,
        stage_texts: &[(&'static str, String)],
    ) -> Option<CompressionStats> {
        let original_tokens = counter.count_tokens(original_text).ok()?;
        let compressed_tokens = counter.count_tokens(final_text).ok()?;
        let mut stages = Vec::with_capacity(stage_texts.len());
        for (stage, text) in stage_texts {
            let tokens = counter.count_tokens(text).ok()?;
            stages.push(StageStats {
                stage,
                tokens,
                ratio: ratio(tokens, original_tokens),
            });
        }
        Some(CompressionStats {
            original_tokens,
            compressed_tokens,
            ratio: ratio(compressed_tokens, original_tokens),
            stages,
            max_tokens: self.options.max_tokens,
        })
    }
}

fn ratio(tokens: usize, original: usize) -> f64 {
    if original == 0 {
        1.0
    } else {
        tokens as f64 / original as f64
    }
}
