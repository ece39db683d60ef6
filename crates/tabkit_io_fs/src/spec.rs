//! Naming/directory policy models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Characters not allowed in output file names.
pub const TUP_FILE_NAME_ILLEGAL: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

////////////////////////////////////////////////////////////////////////////////
// #region PolicyModels

/// File-name derivation policy for per-key output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFileNamePolicy {
    /// Replacement for every illegal character.
    pub replace_to: String,
    /// Name used when the sanitized key is empty.
    pub placeholder_empty: String,
    /// Maximum file stem length in characters.
    pub len_stem_max: usize,
    /// Extension appended to every derived path (no leading dot).
    pub extension: String,
}

impl Default for SpecFileNamePolicy {
    fn default() -> Self {
        Self {
            replace_to: "_".to_string(),
            placeholder_empty: "空值".to_string(),
            len_stem_max: 150,
            extension: "xlsx".to_string(),
        }
    }
}

/// Run-scoped output directory naming policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOutputDirPolicy {
    /// Directory name prefix.
    pub prefix: String,
    /// `chrono` strftime pattern for the local-time suffix.
    pub timestamp_pattern: String,
}

impl Default for SpecOutputDirPolicy {
    fn default() -> Self {
        Self {
            prefix: "output_".to_string(),
            timestamp_pattern: "%Y%m%d_%H%M%S".to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Filesystem-stage failures.
#[derive(Debug, Error)]
pub enum FsNamingError {
    /// Output directory (or one of its parents) could not be created.
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDirCreateFailed {
        /// Directory that failed to initialize.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Workbook path pattern failed to compile.
    #[error("Invalid workbook path pattern: {0}")]
    InvalidPattern(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
