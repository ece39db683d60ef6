//! Single-sheet workbook writer with an append cursor.

use std::path::Path;

use rust_xlsxwriter::{
    Format, FormatAlign, FormatBorder, FormatPattern, FormatUnderline, Workbook, Worksheet,
};

use crate::conf::{C_FMT_DATETIME_DEFAULT, C_FMT_GENERAL, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::error::XlsxIoError;
use crate::spec::{EnumCellValue, SpecAlignment, SpecBorder, SpecCell, SpecFill, SpecFont};
use crate::util::derive_excel_serial;

/// In-memory output workbook; rows are appended top to bottom and the file
/// is written once by [`Self::save`].
pub struct XlsxWriter {
    workbook: Workbook,
    n_row_next: usize,
}

impl Default for XlsxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxWriter {
    /// Create an empty workbook with one worksheet.
    pub fn new() -> Self {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        Self {
            workbook,
            n_row_next: 0,
        }
    }

    /// Number of rows written so far (zero-based index of the next row).
    pub fn n_rows_written(&self) -> usize {
        self.n_row_next
    }

    /// Write `l_cells` at the cursor row and advance the cursor.
    pub fn write_row(&mut self, l_cells: &[SpecCell]) -> Result<(), XlsxIoError> {
        if self.n_row_next >= N_NROWS_EXCEL_MAX {
            return Err(XlsxIoError::ExcelLimit(format!(
                "row {} exceeds {N_NROWS_EXCEL_MAX} rows",
                self.n_row_next + 1
            )));
        }
        if l_cells.len() > N_NCOLS_EXCEL_MAX {
            return Err(XlsxIoError::ExcelLimit(format!(
                "{} columns exceed {N_NCOLS_EXCEL_MAX} columns",
                l_cells.len()
            )));
        }

        let n_row = cast_row_num(self.n_row_next)?;
        let worksheet = self.workbook.worksheet_from_index(0)?;
        for (n_idx_col, cell) in l_cells.iter().enumerate() {
            write_cell_with_format(worksheet, n_row, cast_col_num(n_idx_col)?, cell)?;
        }
        self.n_row_next += 1;
        Ok(())
    }

    /// Serialize the workbook to `path`.
    pub fn save(&mut self, path: &Path) -> Result<(), XlsxIoError> {
        self.workbook.save(path)?;
        Ok(())
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    cell: &SpecCell,
) -> Result<(), XlsxIoError> {
    match &cell.value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, &derive_rust_xlsx_format(cell, None))?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(
                n_row,
                n_col,
                val,
                &derive_rust_xlsx_format(cell, None),
            )?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(
                n_row,
                n_col,
                *val,
                &derive_rust_xlsx_format(cell, None),
            )?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(
                n_row,
                n_col,
                *val,
                &derive_rust_xlsx_format(cell, None),
            )?;
        }
        EnumCellValue::DateTime(val) => {
            let c_fmt_date = (cell.num_format == C_FMT_GENERAL).then_some(C_FMT_DATETIME_DEFAULT);
            worksheet.write_number_with_format(
                n_row,
                n_col,
                derive_excel_serial(val),
                &derive_rust_xlsx_format(cell, c_fmt_date),
            )?;
        }
    }
    Ok(())
}

/// Build the writer format for a resolved cell.
///
/// `num_format_override` replaces the cell's own number format.
fn derive_rust_xlsx_format(cell: &SpecCell, num_format_override: Option<&str>) -> Format {
    let mut format = Format::new();

    let c_num_format = num_format_override.unwrap_or(cell.num_format.as_str());
    if !c_num_format.is_empty() && c_num_format != C_FMT_GENERAL {
        format = format.set_num_format(c_num_format);
    }

    format = apply_font(format, &cell.font);
    format = apply_fill(format, &cell.fill);
    format = apply_border(format, &cell.border);
    apply_alignment(format, &cell.alignment)
}

fn apply_font(mut format: Format, font: &SpecFont) -> Format {
    if let Some(val) = &font.name {
        format = format.set_font_name(val.as_str());
    }
    if let Some(val) = font.size
        && val > 0.0
    {
        format = format.set_font_size(val);
    }
    if font.bold {
        format = format.set_bold();
    }
    if font.italic {
        format = format.set_italic();
    }
    if font.strikethrough {
        format = format.set_font_strikethrough();
    }
    if let Some(val) = &font.underline
        && let Some(underline) = derive_format_underline(val)
    {
        format = format.set_underline(underline);
    }
    if let Some(val) = &font.color {
        format = format.set_font_color(val.as_str());
    }
    format
}

fn apply_fill(mut format: Format, fill: &SpecFill) -> Format {
    if let Some(val) = &fill.pattern
        && let Some(pattern) = derive_format_pattern(val)
    {
        format = format.set_pattern(pattern);
    }
    if let Some(val) = &fill.fg_color {
        format = format.set_foreground_color(val.as_str());
    }
    if let Some(val) = &fill.bg_color {
        format = format.set_background_color(val.as_str());
    }
    format
}

fn apply_border(mut format: Format, border: &SpecBorder) -> Format {
    if border.top.style > 0 {
        format = format.set_border_top(derive_format_border(border.top.style));
    }
    if let Some(val) = &border.top.color {
        format = format.set_border_top_color(val.as_str());
    }
    if border.bottom.style > 0 {
        format = format.set_border_bottom(derive_format_border(border.bottom.style));
    }
    if let Some(val) = &border.bottom.color {
        format = format.set_border_bottom_color(val.as_str());
    }
    if border.left.style > 0 {
        format = format.set_border_left(derive_format_border(border.left.style));
    }
    if let Some(val) = &border.left.color {
        format = format.set_border_left_color(val.as_str());
    }
    if border.right.style > 0 {
        format = format.set_border_right(derive_format_border(border.right.style));
    }
    if let Some(val) = &border.right.color {
        format = format.set_border_right_color(val.as_str());
    }
    format
}

fn apply_alignment(mut format: Format, alignment: &SpecAlignment) -> Format {
    if let Some(val) = &alignment.horizontal
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &alignment.vertical
        && let Some(align) = derive_format_valign(val)
    {
        format = format.set_align(align);
    }
    if alignment.wrap_text {
        format = format.set_text_wrap();
    }
    if alignment.indent > 0 {
        format = format.set_indent(alignment.indent);
    }
    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "centerContinuous" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        _ => None,
    }
}

fn derive_format_valign(align: &str) -> Option<FormatAlign> {
    match align {
        "top" => Some(FormatAlign::Top),
        "center" => Some(FormatAlign::VerticalCenter),
        "bottom" => Some(FormatAlign::Bottom),
        "justify" => Some(FormatAlign::VerticalJustify),
        "distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

fn derive_format_underline(underline: &str) -> Option<FormatUnderline> {
    match underline {
        "single" => Some(FormatUnderline::Single),
        "double" => Some(FormatUnderline::Double),
        "singleAccounting" => Some(FormatUnderline::SingleAccounting),
        "doubleAccounting" => Some(FormatUnderline::DoubleAccounting),
        _ => None,
    }
}

fn derive_format_pattern(pattern: &str) -> Option<FormatPattern> {
    match pattern {
        "solid" => Some(FormatPattern::Solid),
        "mediumGray" => Some(FormatPattern::MediumGray),
        "darkGray" => Some(FormatPattern::DarkGray),
        "lightGray" => Some(FormatPattern::LightGray),
        "darkHorizontal" => Some(FormatPattern::DarkHorizontal),
        "darkVertical" => Some(FormatPattern::DarkVertical),
        "darkDown" => Some(FormatPattern::DarkDown),
        "darkUp" => Some(FormatPattern::DarkUp),
        "darkGrid" => Some(FormatPattern::DarkGrid),
        "darkTrellis" => Some(FormatPattern::DarkTrellis),
        "lightHorizontal" => Some(FormatPattern::LightHorizontal),
        "lightVertical" => Some(FormatPattern::LightVertical),
        "lightDown" => Some(FormatPattern::LightDown),
        "lightUp" => Some(FormatPattern::LightUp),
        "lightGrid" => Some(FormatPattern::LightGrid),
        "lightTrellis" => Some(FormatPattern::LightTrellis),
        "gray125" => Some(FormatPattern::Gray125),
        "gray0625" => Some(FormatPattern::Gray0625),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value).map_err(|_| XlsxIoError::ExcelLimit(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value)
        .map_err(|_| XlsxIoError::ExcelLimit(format!("column index overflow: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_row_advances_cursor() {
        let mut writer = XlsxWriter::new();
        let l_cells = vec![
            SpecCell {
                value: EnumCellValue::String("City".to_string()),
                ..Default::default()
            },
            SpecCell::default(),
        ];

        writer.write_row(&l_cells).expect("write row");
        writer.write_row(&l_cells).expect("write row");
        assert_eq!(writer.n_rows_written(), 2);
    }

    #[test]
    fn test_write_row_rejects_too_wide_rows() {
        let mut writer = XlsxWriter::new();
        let l_cells = vec![SpecCell::default(); N_NCOLS_EXCEL_MAX + 1];

        let err = writer.write_row(&l_cells).expect_err("too wide");
        assert!(matches!(err, XlsxIoError::ExcelLimit(_)));
        assert_eq!(writer.n_rows_written(), 0);
    }

    #[test]
    fn test_format_mapping_tables() {
        assert_eq!(derive_format_border(6), FormatBorder::Double);
        assert_eq!(derive_format_border(99), FormatBorder::None);
        assert_eq!(derive_format_align("centerContinuous"), Some(FormatAlign::CenterAcross));
        assert_eq!(derive_format_valign("center"), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_pattern("gray125"), Some(FormatPattern::Gray125));
        assert_eq!(derive_format_underline("none"), None);
    }
}
