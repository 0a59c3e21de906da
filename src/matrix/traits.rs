//! Collaborator seams for ingestion and token counting.
//!
//! The compression core never reads spreadsheet files and never embeds a
//! tokenizer; both arrive through these traits.

use super::sheet::SheetMatrix;
use crate::common::Result;

/// Produces typed, formatted matrices from some spreadsheet source.
///
/// Implementations are expected to have already inferred cell types and
/// attached merged-region data; the core validates but does not re-derive
/// either.
pub trait SheetSource {
    /// Names of the sheets available from this source.
    fn sheet_names(&self) -> Vec<String>;

    /// Produce the matrix for one sheet.
    fn sheet(&self, name: &str) -> Result<SheetMatrix>;

    /// Produce matrices for every sheet, in `sheet_names` order.
    fn sheets(&self) -> Result<Vec<SheetMatrix>> {
        self.sheet_names()
            .iter()
            .map(|name| self.sheet(name))
            .collect()
    }
}

/// Counts tokens in a piece of text.
///
/// Used only for before/after statistics; counting never influences
/// compression decisions. A failing counter downgrades the pipeline result
/// to text-only (no statistics) rather than aborting it.
pub trait TokenCounter {
    /// Count the tokens in `text`.
    fn count_tokens(&self, text: &str) -> Result<usize>;
}

/// Deterministic fallback counter based on word and length heuristics.
///
/// Approximates subword tokenizers as one token per whitespace-separated
/// word plus one per four characters of overflow for long words. Good
/// enough for ratio reporting when no external tokenizer is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        let mut count = 0usize;
        for word in text.split_whitespace() {
            count += 1 + word.len().saturating_sub(4) / 4;
        }
        Ok(count)
    }
}
