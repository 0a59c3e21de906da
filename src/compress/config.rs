//! Configuration for the compression pipeline.

use serde::{Deserialize, Serialize};

/// Options selecting which compression stages run and their parameters.
///
/// Stages always run in the fixed order anchors -> inverted index ->
/// format aggregation; options only toggle membership, never order.
///
/// # Examples
///
/// ```rust
/// use sheetpress::compress::CompressorOptions;
///
/// // Defaults: anchors on with proximity 4, everything else off.
/// let options = CompressorOptions::default();
///
/// // Or customize
/// let options = CompressorOptions::new()
///     .with_anchors(true)
///     .with_anchor_proximity(2)
///     .with_inverted_index(true)
///     .with_format_aggregation(true);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorOptions {
    /// Whether to run structural-anchor extraction
    pub enable_anchors: bool,
    /// Rows/columns retained on each side of an anchor
    pub anchor_proximity: usize,
    /// Whether to run inverted-index translation
    pub enable_inverted_index: bool,
    /// Whether to run format-aware aggregation
    pub enable_format_aggregation: bool,
    /// Advisory token budget, reported in statistics but never enforced
    pub max_tokens: usize,
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self {
            enable_anchors: true,
            anchor_proximity: 4,
            enable_inverted_index: false,
            enable_format_aggregation: false,
            max_tokens: 4000,
        }
    }
}

impl CompressorOptions {
    /// Create options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle structural-anchor extraction.
    #[inline]
    pub fn with_anchors(mut self, enable: bool) -> Self {
        self.enable_anchors = enable;
        self
    }

    /// Set the anchor proximity window.
    #[inline]
    pub fn with_anchor_proximity(mut self, proximity: usize) -> Self {
        self.anchor_proximity = proximity;
        self
    }

    /// Toggle inverted-index translation.
    #[inline]
    pub fn with_inverted_index(mut self, enable: bool) -> Self {
        self.enable_inverted_index = enable;
        self
    }

    /// Toggle format-aware aggregation.
    #[inline]
    pub fn with_format_aggregation(mut self, enable: bool) -> Self {
        self.enable_format_aggregation = enable;
        self
    }

    /// Set the advisory token budget.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
