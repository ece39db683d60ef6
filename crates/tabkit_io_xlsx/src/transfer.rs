//! Value/style transfer between cells, with date reinterpretation.
//!
//! Transfer works over two capability traits so it does not depend on any
//! concrete workbook library: [`CellSource`] exposes what a source cell has,
//! [`CellSink`] receives what the destination gets.

use crate::reader::SourceCell;
use crate::spec::{
    EnumCellValue, EnumDateEpoch, SpecAlignment, SpecBorder, SpecCell, SpecFill, SpecFont,
    SpecTransferPolicy,
};
use crate::util::{convert_serial_to_datetime, is_date_format, is_header_date_like};

////////////////////////////////////////////////////////////////////////////////
// #region CellCapabilities

/// Read side of a cell.
pub trait CellSource {
    /// Raw value.
    fn value(&self) -> &EnumCellValue;
    /// Number format code, `None` when absent.
    fn number_format(&self) -> Option<&str>;
    /// Font, `None` when absent.
    fn font(&self) -> Option<&SpecFont>;
    /// Fill, `None` when absent.
    fn fill(&self) -> Option<&SpecFill>;
    /// Borders, `None` when absent.
    fn border(&self) -> Option<&SpecBorder>;
    /// Alignment, `None` when absent.
    fn alignment(&self) -> Option<&SpecAlignment>;
}

/// Write side of a cell.
pub trait CellSink {
    /// Assign the value.
    fn set_value(&mut self, value: EnumCellValue);
    /// Assign the number format code.
    fn set_number_format(&mut self, num_format: String);
    /// Assign the font.
    fn set_font(&mut self, font: SpecFont);
    /// Assign the fill.
    fn set_fill(&mut self, fill: SpecFill);
    /// Assign the borders.
    fn set_border(&mut self, border: SpecBorder);
    /// Assign the alignment.
    fn set_alignment(&mut self, alignment: SpecAlignment);
}

impl CellSource for SourceCell {
    fn value(&self) -> &EnumCellValue {
        &self.value
    }

    fn number_format(&self) -> Option<&str> {
        SourceCell::number_format(self)
    }

    fn font(&self) -> Option<&SpecFont> {
        self.style.as_ref()?.font.as_ref()
    }

    fn fill(&self) -> Option<&SpecFill> {
        self.style.as_ref()?.fill.as_ref()
    }

    fn border(&self) -> Option<&SpecBorder> {
        self.style.as_ref()?.border.as_ref()
    }

    fn alignment(&self) -> Option<&SpecAlignment> {
        self.style.as_ref()?.alignment.as_ref()
    }
}

impl CellSink for SpecCell {
    fn set_value(&mut self, value: EnumCellValue) {
        self.value = value;
    }

    fn set_number_format(&mut self, num_format: String) {
        self.num_format = num_format;
    }

    fn set_font(&mut self, font: SpecFont) {
        self.font = font;
    }

    fn set_fill(&mut self, fill: SpecFill) {
        self.fill = fill;
    }

    fn set_border(&mut self, border: SpecBorder) {
        self.border = border;
    }

    fn set_alignment(&mut self, alignment: SpecAlignment) {
        self.alignment = alignment;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Transfer

/// Copy value and style of `src` onto `dst`.
///
/// A numeric value is read as a date when its format is a date format or
/// `header_text` contains a date keyword. A keyword-detected date that had
/// the generic format gets the month/day display. Failed date conversion
/// keeps the raw value and format. Absent style parts reset the destination
/// to defaults; absent alignment under a date header becomes centered.
pub fn copy_cell<S, D>(
    src: &S,
    dst: &mut D,
    epoch: EnumDateEpoch,
    header_text: Option<&str>,
    policy: &SpecTransferPolicy,
) where
    S: CellSource + ?Sized,
    D: CellSink + ?Sized,
{
    let mut c_fmt = match src.number_format() {
        Some(fmt) if !fmt.is_empty() => fmt.to_string(),
        _ => policy.fmt_general.clone(),
    };
    let mut value = src.value().clone();
    let if_header_date = is_header_date_like(header_text, &policy.date_header_keywords);

    if let EnumCellValue::Number(n_serial) = value
        && (is_date_format(&c_fmt) || if_header_date)
    {
        match convert_serial_to_datetime(n_serial, epoch) {
            Ok(dt) => {
                value = EnumCellValue::DateTime(dt);
                if c_fmt == policy.fmt_general && if_header_date {
                    c_fmt = policy.fmt_month_day.clone();
                }
            }
            Err(err) => tracing::trace!(serial = n_serial, %err, "kept raw serial"),
        }
    }

    dst.set_value(value);
    dst.set_number_format(c_fmt);
    dst.set_font(src.font().cloned().unwrap_or_default());
    dst.set_fill(src.fill().cloned().unwrap_or_default());
    dst.set_border(src.border().cloned().unwrap_or_default());
    dst.set_alignment(match src.alignment() {
        Some(alignment) => alignment.clone(),
        None if if_header_date => SpecAlignment::centered(),
        None => SpecAlignment::default(),
    });
}

/// Transfer one source row into destination cells.
///
/// Column `j` uses `l_header_texts[j]` for the date heuristic; columns past
/// the header get none. The row is padded to the header width.
pub fn transfer_row<S: CellSource>(
    l_cells: &[S],
    l_header_texts: &[String],
    epoch: EnumDateEpoch,
    policy: &SpecTransferPolicy,
) -> Vec<SpecCell> {
    let n_width = usize::max(l_cells.len(), l_header_texts.len());
    let cell_blank = SourceCell::default();

    (0..n_width)
        .map(|n_idx_col| {
            let mut cell_dst = SpecCell::default();
            let c_header = l_header_texts.get(n_idx_col).map(String::as_str);
            match l_cells.get(n_idx_col) {
                Some(cell_src) => copy_cell(cell_src, &mut cell_dst, epoch, c_header, policy),
                None => copy_cell(&cell_blank, &mut cell_dst, epoch, c_header, policy),
            }
            cell_dst
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::spec::{SpecBorderSide, SpecCellStyle};

    /// In-memory cell standing in for any workbook library's cell.
    #[derive(Default)]
    struct FakeCell {
        value: EnumCellValue,
        num_format: Option<String>,
        font: Option<SpecFont>,
        fill: Option<SpecFill>,
        border: Option<SpecBorder>,
        alignment: Option<SpecAlignment>,
    }

    impl CellSource for FakeCell {
        fn value(&self) -> &EnumCellValue {
            &self.value
        }
        fn number_format(&self) -> Option<&str> {
            self.num_format.as_deref()
        }
        fn font(&self) -> Option<&SpecFont> {
            self.font.as_ref()
        }
        fn fill(&self) -> Option<&SpecFill> {
            self.fill.as_ref()
        }
        fn border(&self) -> Option<&SpecBorder> {
            self.border.as_ref()
        }
        fn alignment(&self) -> Option<&SpecAlignment> {
            self.alignment.as_ref()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> EnumCellValue {
        EnumCellValue::DateTime(
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .expect("valid date"),
        )
    }

    fn copy(src: &FakeCell, header: Option<&str>) -> SpecCell {
        let mut dst = SpecCell::default();
        copy_cell(
            src,
            &mut dst,
            EnumDateEpoch::Windows1900,
            header,
            &SpecTransferPolicy::default(),
        );
        dst
    }

    #[test]
    fn test_keyword_header_with_general_format_gets_month_day() {
        let src = FakeCell {
            value: EnumCellValue::Number(45292.0),
            ..Default::default()
        };
        let dst = copy(&src, Some("到货时间"));

        assert_eq!(dst.value, date(2024, 1, 1));
        assert_eq!(dst.num_format, r#"m"月"d"日""#);
        assert_eq!(dst.alignment, SpecAlignment::centered());
    }

    #[test]
    fn test_date_format_converts_regardless_of_header() {
        let src = FakeCell {
            value: EnumCellValue::Number(45292.0),
            num_format: Some("yyyy/mm/dd".to_string()),
            ..Default::default()
        };
        let dst = copy(&src, Some("Amount"));

        assert_eq!(dst.value, date(2024, 1, 1));
        assert_eq!(dst.num_format, "yyyy/mm/dd");
        assert_eq!(dst.alignment, SpecAlignment::default());
    }

    #[test]
    fn test_keyword_header_keeps_explicit_format() {
        let src = FakeCell {
            value: EnumCellValue::Number(45292.0),
            num_format: Some("0.00".to_string()),
            ..Default::default()
        };
        let dst = copy(&src, Some("销售时间"));

        assert_eq!(dst.value, date(2024, 1, 1));
        assert_eq!(dst.num_format, "0.00");
    }

    #[test]
    fn test_non_date_numbers_and_text_pass_through() {
        let src = FakeCell {
            value: EnumCellValue::Number(10.0),
            num_format: Some(String::new()),
            ..Default::default()
        };
        let dst = copy(&src, Some("Amount"));
        assert_eq!(dst.value, EnumCellValue::Number(10.0));
        assert_eq!(dst.num_format, "General");

        let src = FakeCell {
            value: EnumCellValue::String("2024-01-01".to_string()),
            ..Default::default()
        };
        let dst = copy(&src, Some("日期"));
        assert_eq!(dst.value, EnumCellValue::String("2024-01-01".to_string()));
        assert_eq!(dst.num_format, "General");

        let src = FakeCell {
            value: EnumCellValue::Boolean(true),
            ..Default::default()
        };
        assert_eq!(copy(&src, Some("日期")).value, EnumCellValue::Boolean(true));
    }

    #[test]
    fn test_failed_conversion_keeps_raw_value_and_format() {
        let src = FakeCell {
            value: EnumCellValue::Number(1e12),
            ..Default::default()
        };
        let dst = copy(&src, Some("确认时间"));

        assert_eq!(dst.value, EnumCellValue::Number(1e12));
        assert_eq!(dst.num_format, "General");
    }

    #[test]
    fn test_styles_copied_or_reset() {
        let font = SpecFont {
            bold: true,
            ..Default::default()
        };
        let border = SpecBorder {
            top: SpecBorderSide {
                style: 1,
                color: None,
            },
            ..Default::default()
        };
        let src = FakeCell {
            value: EnumCellValue::String("x".to_string()),
            font: Some(font.clone()),
            border: Some(border.clone()),
            alignment: Some(SpecAlignment {
                horizontal: Some("right".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mut dst = SpecCell {
            fill: SpecFill {
                pattern: Some("solid".to_string()),
                fg_color: Some("#FF0000".to_string()),
                bg_color: None,
            },
            ..Default::default()
        };
        copy_cell(
            &src,
            &mut dst,
            EnumDateEpoch::Windows1900,
            Some("日期"),
            &SpecTransferPolicy::default(),
        );

        assert_eq!(dst.font, font);
        assert_eq!(dst.border, border);
        assert_eq!(dst.fill, SpecFill::default());
        assert_eq!(dst.alignment.horizontal.as_deref(), Some("right"));
    }

    #[test]
    fn test_transfer_row_pads_to_header_and_uses_column_header() {
        let style = Arc::new(SpecCellStyle::default());
        let l_cells = vec![
            SourceCell {
                value: EnumCellValue::Number(45292.0),
                style: Some(style),
            },
            SourceCell {
                value: EnumCellValue::Number(45292.0),
                style: None,
            },
        ];
        let l_header = vec!["Amount".to_string(), "日期".to_string(), "Note".to_string()];

        let l_out = transfer_row(
            &l_cells,
            &l_header,
            EnumDateEpoch::Windows1900,
            &SpecTransferPolicy::default(),
        );

        assert_eq!(l_out.len(), 3);
        assert_eq!(l_out[0].value, EnumCellValue::Number(45292.0));
        assert_eq!(l_out[1].value, date(2024, 1, 1));
        assert!(l_out[2].value.is_none());
        assert_eq!(l_out[2].num_format, "General");
    }
}
