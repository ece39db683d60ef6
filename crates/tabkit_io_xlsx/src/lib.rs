//! `tabkit_io_xlsx` v1:
//! Rust-side streaming split/merge kernel for `.xlsx` workbooks.
//!
//! - `conf`     : constants, messages and built-in number formats
//! - `spec`     : values/styles/options models
//! - `error`    : error type
//! - `util`     : pure helper functions (date serials, format classification)
//! - `styles`   : `styles.xml` reader
//! - `reader`   : active-sheet row stream and header reader
//! - `transfer` : value/style transfer between cells
//! - `writer`   : single-sheet output writer
//! - `report`   : run reports
//! - `split`    : split by column value
//! - `merge`    : concatenate workbooks
pub mod conf;
pub mod error;
pub mod merge;
pub mod reader;
pub mod report;
pub mod spec;
pub mod split;
pub mod styles;
pub mod transfer;
pub mod util;
pub mod writer;

pub use conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_DATE_HEADER_KEYWORDS};
pub use error::XlsxIoError;
pub use merge::merge_workbooks;
pub use reader::{SourceCell, XlsxReader, XlsxRowStream, read_headers};
pub use report::{ReportMerge, ReportSplit};
pub use spec::{
    EnumCellValue, EnumDateEpoch, EnumGroupKey, SpecAlignment, SpecBorder, SpecBorderSide,
    SpecCell, SpecCellStyle, SpecFill, SpecFont, SpecMergeOptions, SpecSplitOptions,
    SpecTransferPolicy,
};
pub use split::{ProgressCallback, split_workbook};
pub use transfer::{CellSink, CellSource, copy_cell, transfer_row};
pub use util::{EnumSerialError, convert_serial_to_datetime, is_date_format};
pub use writer::XlsxWriter;
