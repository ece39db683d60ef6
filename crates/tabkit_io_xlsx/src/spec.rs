//! Shared XLSX models: cell values, grouping keys, styles and run options.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use tabkit_io_fs::{SpecFileNamePolicy, SpecOutputDirPolicy};

use crate::conf::{
    C_FMT_GENERAL, C_FMT_MONTH_DAY, C_STEM_MERGED, N_PROGRESS_EVERY_ROWS, TUP_DATE_HEADER_KEYWORDS,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Raw cell value as read from a source sheet or assigned to a destination.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Absent/blank cell.
    #[default]
    None,
    /// Text value (shared, inline, formula string or error literal).
    String(String),
    /// Numeric value, including undecoded date serials.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Calendar date-time.
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    /// Whether the value is absent.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Text rendering compatible with the Python GUI shell (`str(value)`):
/// integral numbers print without a decimal point, booleans as
/// `True`/`False`, date-times as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::String(val) => f.write_str(val),
            Self::Number(val) => {
                if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e16 {
                    write!(f, "{}", *val as i64)
                } else {
                    write!(f, "{val}")
                }
            }
            Self::Boolean(val) => f.write_str(if *val { "True" } else { "False" }),
            Self::DateTime(val) => {
                if val.nanosecond() == 0 {
                    write!(f, "{}", val.format("%Y-%m-%d %H:%M:%S"))
                } else {
                    write!(f, "{}", val.format("%Y-%m-%d %H:%M:%S%.6f"))
                }
            }
        }
    }
}

/// Hashable grouping key derived from a raw cell value.
///
/// Keys compare by raw value: `"10"` and `10` are different keys, `10` and
/// `10.0` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumGroupKey {
    /// Text key.
    String(String),
    /// Numeric key as normalized `f64` bits.
    Number(u64),
    /// Boolean key.
    Boolean(bool),
    /// Date-time key.
    DateTime(NaiveDateTime),
}

impl EnumGroupKey {
    /// Derive the key for `value`; `None` for absent values.
    pub fn from_value(value: &EnumCellValue) -> Option<Self> {
        match value {
            EnumCellValue::None => None,
            EnumCellValue::String(val) => Some(Self::String(val.clone())),
            EnumCellValue::Number(val) => {
                // -0.0 == 0.0
                let n_norm = if *val == 0.0 { 0.0 } else { *val };
                Some(Self::Number(n_norm.to_bits()))
            }
            EnumCellValue::Boolean(val) => Some(Self::Boolean(*val)),
            EnumCellValue::DateTime(val) => Some(Self::DateTime(*val)),
        }
    }
}

/// Date system of a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumDateEpoch {
    /// 1900 date system (serial 1 = 1900-01-01, with the phantom 1900-02-29).
    #[default]
    Windows1900,
    /// 1904 date system (serial 0 = 1904-01-01).
    Mac1904,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellStyle

/// Font attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecFont {
    /// Font family name.
    pub name: Option<String>,
    /// Font size in points.
    pub size: Option<f64>,
    /// Bold style.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Underline kind (`single`, `double`, `singleAccounting`, `doubleAccounting`).
    pub underline: Option<String>,
    /// Strikethrough style.
    pub strikethrough: bool,
    /// Font color as `#RRGGBB`.
    pub color: Option<String>,
}

/// Pattern fill attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecFill {
    /// Pattern name as stored in the package (`solid`, `gray125`, ...).
    pub pattern: Option<String>,
    /// Pattern foreground color (`#RRGGBB`); the cell color for solid fills.
    pub fg_color: Option<String>,
    /// Pattern background color (`#RRGGBB`).
    pub bg_color: Option<String>,
}

/// One border edge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecBorderSide {
    /// Border style code, `0` (none) to `13` (slant dash-dot).
    pub style: i64,
    /// Edge color as `#RRGGBB`.
    pub color: Option<String>,
}

/// Cell borders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecBorder {
    /// Top edge.
    pub top: SpecBorderSide,
    /// Bottom edge.
    pub bottom: SpecBorderSide,
    /// Left edge.
    pub left: SpecBorderSide,
    /// Right edge.
    pub right: SpecBorderSide,
}

/// Cell alignment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecAlignment {
    /// Horizontal alignment name (`left`, `center`, `right`, ...).
    pub horizontal: Option<String>,
    /// Vertical alignment name (`top`, `center`, `bottom`, ...).
    pub vertical: Option<String>,
    /// Wrap text.
    pub wrap_text: bool,
    /// Indent level.
    pub indent: u8,
}

impl SpecAlignment {
    /// Center horizontally, everything else default.
    pub fn centered() -> Self {
        Self {
            horizontal: Some("center".to_string()),
            ..Default::default()
        }
    }
}

/// Style record of a source cell; `None` parts are absent in the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCellStyle {
    /// Number format code.
    pub num_format: Option<String>,
    /// Font.
    pub font: Option<SpecFont>,
    /// Fill.
    pub fill: Option<SpecFill>,
    /// Borders.
    pub border: Option<SpecBorder>,
    /// Alignment.
    pub alignment: Option<SpecAlignment>,
}

/// Fully resolved destination cell, ready for the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCell {
    /// Cell value.
    pub value: EnumCellValue,
    /// Number format code, never empty.
    pub num_format: String,
    /// Font.
    pub font: SpecFont,
    /// Fill.
    pub fill: SpecFill,
    /// Borders.
    pub border: SpecBorder,
    /// Alignment.
    pub alignment: SpecAlignment,
}

impl Default for SpecCell {
    fn default() -> Self {
        Self {
            value: EnumCellValue::None,
            num_format: C_FMT_GENERAL.to_string(),
            font: SpecFont::default(),
            fill: SpecFill::default(),
            border: SpecBorder::default(),
            alignment: SpecAlignment::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RunOptions

/// Value/style transfer policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTransferPolicy {
    /// Header substrings that mark a column as holding dates.
    pub date_header_keywords: Vec<String>,
    /// Format applied to keyword-detected dates that had the generic format.
    pub fmt_month_day: String,
    /// Generic format name.
    pub fmt_general: String,
}

impl Default for SpecTransferPolicy {
    fn default() -> Self {
        Self {
            date_header_keywords: TUP_DATE_HEADER_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            fmt_month_day: C_FMT_MONTH_DAY.to_string(),
            fmt_general: C_FMT_GENERAL.to_string(),
        }
    }
}

/// Options for [`crate::split::split_workbook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSplitOptions {
    /// Value/style transfer policy.
    pub transfer_policy: SpecTransferPolicy,
    /// Rows between two progress notifications; `0` disables the cadence.
    pub progress_every_rows: usize,
    /// Per-key file naming.
    pub file_name_policy: SpecFileNamePolicy,
    /// Run directory naming.
    pub output_dir_policy: SpecOutputDirPolicy,
}

impl Default for SpecSplitOptions {
    fn default() -> Self {
        Self {
            transfer_policy: SpecTransferPolicy::default(),
            progress_every_rows: N_PROGRESS_EVERY_ROWS,
            file_name_policy: SpecFileNamePolicy::default(),
            output_dir_policy: SpecOutputDirPolicy::default(),
        }
    }
}

/// Options for [`crate::merge::merge_workbooks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMergeOptions {
    /// Value/style transfer policy.
    pub transfer_policy: SpecTransferPolicy,
    /// Output file stem.
    pub stem_merged: String,
    /// Output file extension (no leading dot).
    pub extension: String,
    /// Run directory naming.
    pub output_dir_policy: SpecOutputDirPolicy,
}

impl Default for SpecMergeOptions {
    fn default() -> Self {
        Self {
            transfer_policy: SpecTransferPolicy::default(),
            stem_merged: C_STEM_MERGED.to_string(),
            extension: SpecFileNamePolicy::default().extension,
            output_dir_policy: SpecOutputDirPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_cell_value_display_matches_python_str() {
        assert_eq!(EnumCellValue::Number(10.0).to_string(), "10");
        assert_eq!(EnumCellValue::Number(-3.0).to_string(), "-3");
        assert_eq!(EnumCellValue::Number(10.5).to_string(), "10.5");
        assert_eq!(EnumCellValue::Boolean(true).to_string(), "True");
        assert_eq!(EnumCellValue::None.to_string(), "");

        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .expect("valid datetime");
        assert_eq!(EnumCellValue::DateTime(dt).to_string(), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_group_key_equality_follows_raw_value() {
        let key_num = EnumGroupKey::from_value(&EnumCellValue::Number(10.0));
        let key_text = EnumGroupKey::from_value(&EnumCellValue::String("10".to_string()));
        assert_ne!(key_num, key_text);

        assert_eq!(
            EnumGroupKey::from_value(&EnumCellValue::Number(0.0)),
            EnumGroupKey::from_value(&EnumCellValue::Number(-0.0))
        );
        assert_eq!(EnumGroupKey::from_value(&EnumCellValue::None), None);
        assert!(EnumGroupKey::from_value(&EnumCellValue::String(String::new())).is_some());
    }

    #[test]
    fn test_default_options() {
        let options = SpecSplitOptions::default();
        assert_eq!(options.progress_every_rows, 1_000);
        assert_eq!(options.transfer_policy.date_header_keywords.len(), 7);

        let options = SpecMergeOptions::default();
        assert_eq!(options.stem_merged, "merged");
        assert_eq!(options.extension, "xlsx");
    }
}
