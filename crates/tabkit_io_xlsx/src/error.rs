//! Error types for workbook reading, writing, split and merge.

use std::io;
use std::path::PathBuf;

use tabkit_io_fs::FsNamingError;
use thiserror::Error;

/// Failures surfaced by the split/merge engine.
///
/// `Locked`, `EmptyInput` and `ColumnNotFound` are the recognized kinds and
/// carry user-facing text; every other variant propagates an unclassified
/// IO/format failure unchanged.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Source held by another process (or otherwise denied).
    #[error("{message}")]
    Locked {
        /// Source that failed to open.
        path: PathBuf,
        /// User-facing message for the calling entry point.
        message: String,
    },
    /// No header row, or nothing to merge.
    #[error("{0}")]
    EmptyInput(String),
    /// Split column missing from the header.
    #[error("未找到列：{0}")]
    ColumnNotFound(String),
    /// Output would exceed worksheet bounds.
    #[error("Excel limit exceeded: {0}")]
    ExcelLimit(String),
    /// Underlying IO failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Package (zip container) failure.
    #[error("xlsx package error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// XML part failure.
    #[error("xlsx xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Workbook serialization failure.
    #[error("xlsx write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    /// Output directory failure.
    #[error(transparent)]
    Fs(#[from] FsNamingError),
    /// Structurally invalid package content.
    #[error("malformed xlsx content: {0}")]
    Malformed(String),
}

impl XlsxIoError {
    /// Whether this is one of the recognized, user-facing kinds.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Locked { .. } | Self::EmptyInput(_) | Self::ColumnNotFound(_)
        )
    }
}
