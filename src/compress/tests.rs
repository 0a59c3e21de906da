//! Scenario and property tests for the compression pipeline.

use super::*;
use crate::matrix::{CellValue, FormatFlags, FormatSignature, SheetMatrix};

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn header_format() -> FormatSignature {
    FormatSignature::from_flags(FormatFlags::BOLD | FormatFlags::HIGHLIGHTED)
}

/// 30x4 sheet with three labeled sections separated by blank gaps, two
/// bold/highlighted header cells per section.
fn sectioned_survey() -> SheetMatrix {
    let mut builder = SheetMatrix::builder("survey", 30, 4);
    for (start, label) in [(0, "Geography"), (12, "Gender"), (24, "Age")] {
        builder.set(start, 0, text(label), header_format());
        builder.set(start, 1, text("Count"), header_format());
        for offset in 1..4 {
            builder.set(start + offset, 0, text("group"), FormatSignature::plain());
            builder.set(
                start + offset,
                1,
                CellValue::Int((start + offset) as i64),
                FormatSignature::plain(),
            );
        }
    }
    builder.finish().unwrap()
}

#[test]
fn test_sectioned_survey_keeps_headers_with_windows() {
    let matrix = sectioned_survey();
    let extraction = anchor::extract(&matrix, 4).unwrap();

    // Every header row and its +-4 window must be retained.
    for header in [0usize, 12, 24] {
        for row in header.saturating_sub(4)..=(header + 4).min(29) {
            assert!(
                extraction.row_origin.contains(&row),
                "row {row} near header {header} was dropped"
            );
        }
    }

    // Interior blank runs beyond the proximity windows collapse into one
    // marker each.
    assert_eq!(
        extraction.omitted_rows,
        vec![
            OmittedRun { start: 6, end: 7 },
            OmittedRun { start: 18, end: 19 },
        ]
    );
}

#[test]
fn test_sectioned_survey_end_to_end_round_trip() {
    let matrix = sectioned_survey();
    let compressor = SheetCompressor::new(
        CompressorOptions::new()
            .with_inverted_index(true)
            .with_format_aggregation(true),
    );
    let compressed = compressor.compress(&matrix).unwrap();

    // Omitted runs surface as markers; the header sections survive.
    assert!(compressed.text.contains("rows 7-8 (2 omitted)"));
    assert!(compressed.text.contains("Geography"));
    assert!(compressed.text.contains("## Value Index"));

    // Every retained original resolves back through the composed map.
    for row in 0..matrix.rows() {
        for col in 0..matrix.cols() {
            if compressed.map.is_retained(row, col) {
                let reference = compressed.map.compressed_of(row, col).unwrap();
                assert!(
                    compressed.map.original_of(reference).contains(&(row, col)),
                    "({row}, {col}) does not round-trip"
                );
            }
        }
    }

    let stats = compressed.stats.expect("heuristic counter never fails");
    assert_eq!(stats.stages.len(), 3);
    assert!(stats.original_tokens > 0);
}

#[test]
fn test_uniform_filler_shrinks_token_count() {
    // 40 rows of identical filler: anchors keep only the edge windows, so
    // the value layer drops 30 rows' worth of lines.
    let mut builder = SheetMatrix::builder("filler", 40, 2);
    for row in 0..40 {
        builder.set(row, 0, CellValue::Int(7), FormatSignature::plain());
        builder.set(row, 1, text("steady"), FormatSignature::plain());
    }
    let matrix = builder.finish().unwrap();

    let compressor = SheetCompressor::new(CompressorOptions::default());
    let compressed = compressor.compress(&matrix).unwrap();
    assert!(compressed.text.contains("rows 6-35 (30 omitted)"));

    let stats = compressed.stats.unwrap();
    assert!(stats.compressed_tokens < stats.original_tokens);
    assert!(stats.ratio < 1.0);
}

#[test]
fn test_no_coordinate_loss_for_retained_cells() {
    // The union of original_of over all live references must equal the set
    // of retained originals exactly.
    let matrix = sectioned_survey();
    let compressor = SheetCompressor::new(CompressorOptions::new().with_inverted_index(true));
    let compressed = compressor.compress(&matrix).unwrap();

    let mut union = std::collections::BTreeSet::new();
    for (_, reference) in compressed.map.iter() {
        if reference.is_retained() {
            assert!(!compressed.map.original_of(reference).is_empty());
            union.extend(compressed.map.original_of(reference).iter().copied());
        }
    }
    let retained: std::collections::BTreeSet<_> = (0..matrix.rows())
        .flat_map(|r| (0..matrix.cols()).map(move |c| (r, c)))
        .filter(|&(r, c)| compressed.map.is_retained(r, c))
        .collect();
    assert_eq!(union, retained);
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for cell values drawn from a small pool so repeats occur.
    fn value_strategy() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            3 => Just(CellValue::Empty),
            2 => (0i64..4).prop_map(CellValue::Int),
            2 => prop_oneof![
                Just("Revenue"),
                Just("Cost"),
                Just("north"),
                Just("0.5"),
            ]
            .prop_map(|s| CellValue::Text(s.to_string())),
            1 => any::<bool>().prop_map(CellValue::Bool),
            1 => Just(CellValue::Float(0.5)),
        ]
    }

    /// Strategy for a small pool of format signatures.
    fn format_strategy() -> impl Strategy<Value = FormatSignature> {
        prop_oneof![
            4 => Just(FormatSignature::plain()),
            2 => Just(FormatSignature::from_flags(FormatFlags::BOLD)),
            1 => Just(FormatSignature::from_flags(
                FormatFlags::BORDERED | FormatFlags::HIGHLIGHTED
            )),
        ]
    }

    /// Strategy for matrices up to 8x6.
    fn matrix_strategy() -> impl Strategy<Value = SheetMatrix> {
        (1usize..=8, 1usize..=6)
            .prop_flat_map(|(rows, cols)| {
                prop::collection::vec(
                    (value_strategy(), format_strategy()),
                    rows * cols,
                )
                .prop_map(move |cells| {
                    let mut builder = SheetMatrix::builder("gen", rows, cols);
                    for (i, (value, format)) in cells.into_iter().enumerate() {
                        builder.set(i / cols, i % cols, value, format);
                    }
                    builder.finish().unwrap()
                })
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_blocks_partition_the_grid(matrix in matrix_strategy()) {
            let blocks = aggregate::aggregate(&matrix);
            let mut covered = vec![0usize; matrix.rows() * matrix.cols()];
            for block in &blocks {
                for (row, col) in block.range.coordinates() {
                    covered[row * matrix.cols() + col] += 1;
                }
            }
            prop_assert!(covered.iter().all(|&count| count == 1));
        }

        #[test]
        fn prop_aggregation_is_idempotent(matrix in matrix_strategy()) {
            let blocks = aggregate::aggregate(&matrix);
            let mut builder = SheetMatrix::builder("again", matrix.rows(), matrix.cols());
            for block in &blocks {
                for (row, col) in block.range.coordinates() {
                    builder.set(row, col, CellValue::Empty, block.signature);
                }
            }
            let again = aggregate::aggregate(&builder.finish().unwrap());
            prop_assert_eq!(blocks, again);
        }

        #[test]
        fn prop_round_trip_survives_any_stage_subset(
            matrix in matrix_strategy(),
            anchors in any::<bool>(),
            proximity in 0usize..4,
            inverted in any::<bool>(),
            aggregation in any::<bool>(),
        ) {
            let compressor = SheetCompressor::new(
                CompressorOptions::new()
                    .with_anchors(anchors)
                    .with_anchor_proximity(proximity)
                    .with_inverted_index(inverted)
                    .with_format_aggregation(aggregation),
            );
            let compressed = compressor.compress(&matrix).unwrap();
            for row in 0..matrix.rows() {
                for col in 0..matrix.cols() {
                    let Some(reference) = compressed.map.compressed_of(row, col) else {
                        prop_assert!(false, "({}, {}) missing from map", row, col);
                        continue;
                    };
                    prop_assert!(
                        compressed.map.original_of(reference).contains(&(row, col)),
                        "({}, {}) does not round-trip through {}",
                        row, col, reference
                    );
                }
            }
        }

        #[test]
        fn prop_anchor_retention_is_monotonic(
            matrix in matrix_strategy(),
            proximity in 0usize..5,
        ) {
            let narrow = anchor::extract(&matrix, proximity).unwrap();
            let wide = anchor::extract(&matrix, proximity + 1).unwrap();
            let narrow_count = narrow.row_origin.len() * narrow.col_origin.len();
            let wide_count = wide.row_origin.len() * wide.col_origin.len();
            prop_assert!(wide_count >= narrow_count);
        }

        #[test]
        fn prop_index_expansion_is_faithful(matrix in matrix_strategy()) {
            let translation = index::translate(&matrix);
            for entry in translation.index.entries() {
                for ((row, col), canonical) in index::expand_entry(entry) {
                    let original = matrix.cell(row, col).unwrap();
                    let original_canonical = index::canonical_value(&original.value);
                    prop_assert_eq!(original_canonical.as_deref(), Some(canonical));
                    prop_assert_eq!(original.data_type, entry.data_type);
                }
            }
        }
    }
}
