//! XLSX constants, user-facing messages and built-in number formats.

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;

/// Generic number format name.
pub const C_FMT_GENERAL: &str = "General";
/// Month/day display applied to keyword-detected dates under `General`.
pub const C_FMT_MONTH_DAY: &str = r#"m"月"d"日""#;
/// Display used when a date-time value arrives without any date format.
pub const C_FMT_DATETIME_DEFAULT: &str = "yyyy-mm-dd h:mm:ss";

/// Header substrings that mark a column as holding dates.
pub const TUP_DATE_HEADER_KEYWORDS: [&str; 7] = [
    "时间",
    "日期",
    "到货",
    "到款",
    "销售时间",
    "到货时间",
    "确认时间",
];

/// Rows between two progress notifications during split.
pub const N_PROGRESS_EVERY_ROWS: usize = 1_000;
/// File stem of the merge output.
pub const C_STEM_MERGED: &str = "merged";

// #region Messages
pub const C_MSG_HEADERS_LOCKED: &str = "文件可能被其它程序占用，请关闭后重试";
pub const C_MSG_SPLIT_LOCKED: &str = "源文件被占用或无法读取，请关闭占用程序";
pub const C_MSG_MERGE_LOCKED: &str = "其中一个文件被占用或无法读取，请关闭占用程序";
pub const C_MSG_EMPTY_SHEET: &str = "文件为空或无表头";
pub const C_MSG_EMPTY_MERGE: &str = "未提供可合并的文件";
// #endregion

/// Legacy `indexed="N"` palette. Ids 64 and 65 are the system foreground
/// and background and have no fixed color.
pub const TUP_INDEXED_COLORS: [&str; 64] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#800000", "#008000", "#000080", "#808000", "#800080", "#008080", "#C0C0C0", "#808080",
    "#9999FF", "#993366", "#FFFFCC", "#CCFFFF", "#660066", "#FF8080", "#0066CC", "#CCCCFF",
    "#000080", "#FF00FF", "#FFFF00", "#00FFFF", "#800080", "#800000", "#008080", "#0000FF",
    "#00CCFF", "#CCFFFF", "#CCFFCC", "#FFFF99", "#99CCFF", "#FF99CC", "#CC99FF", "#FFCC99",
    "#3366FF", "#33CCCC", "#99CC00", "#FFCC00", "#FF9900", "#FF6600", "#666699", "#969696",
    "#003366", "#339966", "#003300", "#333300", "#993300", "#993366", "#333399", "#333333",
];

/// Resolve a built-in `numFmtId` to its format code.
///
/// Covers the locale-neutral ids 0-49 plus the zh-CN date/time ids that
/// Chinese Excel builds store without a `numFmt` entry.
pub fn derive_builtin_num_format(id: u32) -> Option<&'static str> {
    let c_fmt = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => r##""$"#,##0_);("$"#,##0)"##,
        6 => r##""$"#,##0_);[Red]("$"#,##0)"##,
        7 => r##""$"#,##0.00_);("$"#,##0.00)"##,
        8 => r##""$"#,##0.00_);[Red]("$"#,##0.00)"##,
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        27 | 36 | 50 | 52 | 57 => r#"yyyy"年"m"月""#,
        28 | 29 | 51 | 53 | 54 | 58 => r#"m"月"d"日""#,
        30 => "m-d-yy",
        31 => r#"yyyy"年"m"月"d"日""#,
        32 => r#"h"时"mm"分""#,
        33 => r#"h"时"mm"分"ss"秒""#,
        34 | 55 => r#"上午/下午h"时"mm"分""#,
        35 | 56 => r#"上午/下午h"时"mm"分"ss"秒""#,
        37 => "#,##0_);(#,##0)",
        38 => "#,##0_);[Red](#,##0)",
        39 => "#,##0.00_);(#,##0.00)",
        40 => "#,##0.00_);[Red](#,##0.00)",
        41 => r#"_(* #,##0_);_(* \(#,##0\);_(* "-"_);_(@_)"#,
        42 => r#"_("$"* #,##0_);_("$"* \(#,##0\);_("$"* "-"_);_(@_)"#,
        43 => r#"_(* #,##0.00_);_(* \(#,##0.00\);_(* "-"??_);_(@_)"#,
        44 => r#"_("$"* #,##0.00_)_("$"* \(#,##0.00\)_("$"* "-"??_)_(@_)"#,
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(c_fmt)
}
