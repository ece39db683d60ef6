use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use globset::GlobBuilder;

use crate::spec::{FsNamingError, SpecOutputDirPolicy};

////////////////////////////////////////////////////////////////////////////////
// #region OutputDirectory

/// Create `dir_base/<prefix><local timestamp>` and return its path.
///
/// Parents are created as needed. An existing directory with the same name is
/// reused without error (two calls inside the same second share it).
pub fn create_output_dir(
    dir_base: &Path,
    policy: &SpecOutputDirPolicy,
) -> Result<PathBuf, FsNamingError> {
    create_output_dir_at(dir_base, policy, Local::now().naive_local())
}

/// Same as [`create_output_dir`], stamped with an explicit time.
pub fn create_output_dir_at(
    dir_base: &Path,
    policy: &SpecOutputDirPolicy,
    dt_stamp: NaiveDateTime,
) -> Result<PathBuf, FsNamingError> {
    let c_name_dir = format!(
        "{}{}",
        policy.prefix,
        dt_stamp.format(&policy.timestamp_pattern)
    );
    let path_dir = dir_base.join(c_name_dir);

    fs::create_dir_all(&path_dir).map_err(|source| FsNamingError::OutputDirCreateFailed {
        path: path_dir.clone(),
        source,
    })?;
    tracing::debug!(dir = %path_dir.display(), "output directory ready");

    Ok(path_dir)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SourceSelection

/// Keep only `.xlsx` workbook paths (case-insensitive), preserving order.
pub fn filter_workbook_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, FsNamingError> {
    let matcher = GlobBuilder::new("*.xlsx")
        .case_insensitive(true)
        .build()
        .map_err(|e| FsNamingError::InvalidPattern(e.to_string()))?
        .compile_matcher();

    Ok(paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|path| {
            path.file_name()
                .is_some_and(|name_file| matcher.is_match(Path::new(name_file)))
        })
        .map(Path::to_path_buf)
        .collect())
}

/// Whether an open failure means another process holds the file.
pub fn is_lock_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
