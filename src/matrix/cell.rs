//! Cell values, coarse data types, and format signatures.

use crate::common::RGBColor;
use bitflags::bitflags;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value stored in a single cell.
///
/// `IndexRef` is not produced by ingestion; the inverted-index stage writes it
/// in place of repeated values, pointing at a [`ValueIndex`] entry by id.
///
/// [`ValueIndex`]: crate::compress::ValueIndex
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// String value
    Text(String),
    /// Date/time value
    DateTime(NaiveDateTime),
    /// Reference to a value-index entry, written by the inverted-index stage
    IndexRef(u32),
}

impl CellValue {
    /// Check whether the value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Coarse data-type class used for fingerprinting and index grouping.
///
/// Textual values carrying an annotated numeric or date shape (percentages,
/// currency amounts, `12/31/2024`) classify into `Number`/`Date` rather
/// than `Text`. A bare numeric string like `"0.5"` stays `Text`: only the
/// typed `Float`/`Int` variants are `Number`, so a number and its textual
/// rendering never share a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    /// No value
    Empty,
    /// Integer, float, percentage, or currency amount
    Number,
    /// Date or date/time
    Date,
    /// Boolean
    Boolean,
    /// Everything else textual
    Text,
}

impl DataType {
    /// Infer the coarse class of a value.
    pub fn infer(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => DataType::Empty,
            CellValue::Bool(_) => DataType::Boolean,
            CellValue::Int(_) | CellValue::Float(_) => DataType::Number,
            CellValue::DateTime(_) => DataType::Date,
            CellValue::Text(s) => Self::infer_text(s),
            // Reference tokens keep the class of the value they stand for;
            // grouping never re-infers them, so Text is never observed here.
            CellValue::IndexRef(_) => DataType::Text,
        }
    }

    /// Classify a textual value by shape.
    fn infer_text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return DataType::Empty;
        }
        if looks_percentage(trimmed) || looks_currency(trimmed) {
            return DataType::Number;
        }
        if looks_date(trimmed) {
            return DataType::Date;
        }
        if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
            return DataType::Boolean;
        }
        DataType::Text
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Empty => "EMPTY",
            DataType::Number => "NUM",
            DataType::Date => "DATE",
            DataType::Boolean => "BOOL",
            DataType::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Whether a string has a percentage shape: `-12.5%`.
fn looks_percentage(s: &str) -> bool {
    s.strip_suffix('%')
        .is_some_and(|body| body.parse::<f64>().is_ok())
}

/// Whether a string has a currency shape: `$1,234.00`, `-€42`.
fn looks_currency(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let Some(rest) = body.strip_prefix(['$', '€', '£', '¥']) else {
        return false;
    };
    let digits: String = rest.chars().filter(|c| *c != ',').collect();
    !digits.is_empty() && digits.parse::<f64>().is_ok()
}

/// Whether a string has a `d/m/y` or `d-m-y` date shape.
fn looks_date(s: &str) -> bool {
    for sep in ['/', '-'] {
        let parts: Vec<&str> = s.split(sep).collect();
        if parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.len() <= 4) {
            if parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
                return true;
            }
        }
    }
    false
}

bitflags! {
    /// Named style flags attached to a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FormatFlags: u16 {
        /// Bold font
        const BOLD = 0x0001;
        /// Italic font
        const ITALIC = 0x0002;
        /// Underlined text
        const UNDERLINE = 0x0004;
        /// Struck-through text
        const STRIKETHROUGH = 0x0008;
        /// Solid fill behind the cell
        const HIGHLIGHTED = 0x0010;
        /// Any border edge present
        const BORDERED = 0x0020;
        /// Horizontally centered
        const CENTER_ALIGNED = 0x0040;
        /// Left-aligned
        const LEFT_ALIGNED = 0x0080;
        /// Right-aligned
        const RIGHT_ALIGNED = 0x0100;
    }
}

impl FormatFlags {
    /// Ordered `(flag, name)` pairs used for stable display.
    const NAMES: [(FormatFlags, &'static str); 9] = [
        (FormatFlags::BOLD, "BOLD"),
        (FormatFlags::ITALIC, "ITALIC"),
        (FormatFlags::UNDERLINE, "UNDERLINE"),
        (FormatFlags::STRIKETHROUGH, "STRIKETHROUGH"),
        (FormatFlags::HIGHLIGHTED, "HIGHLIGHTED"),
        (FormatFlags::BORDERED, "BORDERED"),
        (FormatFlags::CENTER_ALIGNED, "CENTER"),
        (FormatFlags::LEFT_ALIGNED, "LEFT"),
        (FormatFlags::RIGHT_ALIGNED, "RIGHT"),
    ];
}

/// Full set of style attributes attached to a cell.
///
/// Signatures are order-irrelevant and equality-comparable; they are the
/// grouping key of the format-aware aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FormatSignature {
    /// Named style flags
    pub flags: FormatFlags,
    /// Solid fill color, if any
    pub fill_color: Option<RGBColor>,
    /// Font color, if any
    pub font_color: Option<RGBColor>,
}

impl FormatSignature {
    /// The fully unstyled signature.
    #[inline]
    pub const fn plain() -> Self {
        Self {
            flags: FormatFlags::empty(),
            fill_color: None,
            font_color: None,
        }
    }

    /// Create a signature from flags alone.
    #[inline]
    pub const fn from_flags(flags: FormatFlags) -> Self {
        Self {
            flags,
            fill_color: None,
            font_color: None,
        }
    }

    /// Whether the signature carries no styling at all.
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.flags.is_empty() && self.fill_color.is_none() && self.font_color.is_none()
    }

    /// Whether the signature carries font emphasis (bold/italic/underline).
    #[inline]
    pub fn is_emphasized(&self) -> bool {
        self.flags
            .intersects(FormatFlags::BOLD | FormatFlags::ITALIC | FormatFlags::UNDERLINE)
    }

    /// Whether the signature carries visual decoration (fill, border, colors).
    #[inline]
    pub fn is_decorated(&self) -> bool {
        self.flags
            .intersects(FormatFlags::HIGHLIGHTED | FormatFlags::BORDERED)
            || self.fill_color.is_some()
            || self.font_color.is_some()
    }
}

impl fmt::Display for FormatSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_plain() {
            return f.write_str("(plain)");
        }
        let mut first = true;
        for (flag, name) in FormatFlags::NAMES {
            if self.flags.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if let Some(fill) = self.fill_color {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "fill:{}", fill)?;
            first = false;
        }
        if let Some(font) = self.font_color {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "fg:{}", font)?;
        }
        Ok(())
    }
}

/// An immutable cell: value, inferred type, and format signature at a 0-based
/// `(row, col)` coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// 0-based row index
    pub row: usize,
    /// 0-based column index
    pub col: usize,
    /// Raw value
    pub value: CellValue,
    /// Coarse data-type class, inferred once at construction
    pub data_type: DataType,
    /// Style attributes
    pub format: FormatSignature,
}

impl Cell {
    /// Create a cell, inferring its data type from the value.
    pub fn new(row: usize, col: usize, value: CellValue, format: FormatSignature) -> Self {
        let data_type = DataType::infer(&value);
        Self {
            row,
            col,
            value,
            data_type,
            format,
        }
    }

    /// Create an empty, unstyled cell.
    #[inline]
    pub fn empty(row: usize, col: usize) -> Self {
        Self::new(row, col, CellValue::Empty, FormatSignature::plain())
    }

    /// Check whether the cell holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The cell's A1-style address.
    #[inline]
    pub fn address(&self) -> String {
        crate::common::format_address(self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_scalar_types() {
        assert_eq!(DataType::infer(&CellValue::Empty), DataType::Empty);
        assert_eq!(DataType::infer(&CellValue::Bool(true)), DataType::Boolean);
        assert_eq!(DataType::infer(&CellValue::Int(42)), DataType::Number);
        assert_eq!(DataType::infer(&CellValue::Float(0.5)), DataType::Number);
    }

    #[test]
    fn test_infer_textual_shapes() {
        let t = |s: &str| DataType::infer(&CellValue::Text(s.to_string()));
        assert_eq!(t("Revenue"), DataType::Text);
        // Bare numeric strings stay textual; only annotated shapes promote.
        assert_eq!(t("0.5"), DataType::Text);
        assert_eq!(t("1234"), DataType::Text);
        assert_eq!(t("12.5%"), DataType::Number);
        assert_eq!(t("$1,234.00"), DataType::Number);
        assert_eq!(t("12/31/2024"), DataType::Date);
        assert_eq!(t("3-1-24"), DataType::Date);
        assert_eq!(t("  "), DataType::Empty);
        assert_eq!(t("TRUE"), DataType::Boolean);
    }

    #[test]
    fn test_signature_display_is_stable() {
        let sig = FormatSignature {
            flags: FormatFlags::HIGHLIGHTED | FormatFlags::BOLD,
            fill_color: Some(RGBColor::new(255, 255, 0)),
            font_color: None,
        };
        assert_eq!(sig.to_string(), "BOLD|HIGHLIGHTED fill:#FFFF00");
        assert_eq!(FormatSignature::plain().to_string(), "(plain)");
    }

    #[test]
    fn test_signature_classes() {
        let bold = FormatSignature::from_flags(FormatFlags::BOLD);
        assert!(bold.is_emphasized());
        assert!(!bold.is_decorated());

        let filled = FormatSignature {
            flags: FormatFlags::HIGHLIGHTED,
            fill_color: Some(RGBColor::new(0, 0, 255)),
            font_color: None,
        };
        assert!(filled.is_decorated());
        assert!(!filled.is_emphasized());
    }
}
