//! `tabkit_io_fs` v1:
//! Rust-side filesystem helpers for run-scoped spreadsheet outputs.
//!
//! - `naming` : file-name sanitizing and collision-free output paths
//! - `spec`   : policies/errors
//! - `util`   : output directory allocation and source selection

pub mod naming;
pub mod spec;
pub mod util;

pub use naming::{derive_reserved_key, derive_unique_path, sanitize_file_name};
pub use spec::{FsNamingError, SpecFileNamePolicy, SpecOutputDirPolicy, TUP_FILE_NAME_ILLEGAL};
pub use util::{create_output_dir, create_output_dir_at, is_lock_error, filter_workbook_paths};
