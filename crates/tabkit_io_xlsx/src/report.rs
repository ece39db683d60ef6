//! Run reports returned by split and merge.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one split run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSplit {
    /// Run-scoped output directory.
    pub dir_output: PathBuf,
    /// Saved files, in group-creation order.
    pub files_written: Vec<PathBuf>,
    /// Data rows read (including skipped ones).
    pub cnt_rows_processed: u64,
    /// Data rows skipped for an absent key.
    pub cnt_rows_skipped: u64,
    /// Distinct keys seen.
    pub cnt_groups: u64,
}

impl ReportSplit {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_processed".to_string(), self.cnt_rows_processed);
        dict_counts.insert("cnt_rows_skipped".to_string(), self.cnt_rows_skipped);
        dict_counts.insert("cnt_groups".to_string(), self.cnt_groups);
        dict_counts.insert(
            "cnt_files_written".to_string(),
            self.files_written.len() as u64,
        );
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} rows={} skipped={} groups={} files={} dir={}",
            dict_counts["cnt_rows_processed"],
            dict_counts["cnt_rows_skipped"],
            dict_counts["cnt_groups"],
            dict_counts["cnt_files_written"],
            self.dir_output.display()
        )
    }
}

impl fmt::Display for ReportSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SPLIT]"))
    }
}

/// Outcome of one merge run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportMerge {
    /// Run-scoped output directory.
    pub dir_output: PathBuf,
    /// Merged workbook path.
    pub file_written: PathBuf,
    /// Inputs consumed.
    pub cnt_files: u64,
    /// Data rows appended (header excluded).
    pub cnt_rows_written: u64,
}

impl ReportMerge {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_files".to_string(), self.cnt_files);
        dict_counts.insert("cnt_rows_written".to_string(), self.cnt_rows_written);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} files={} rows={} out={}",
            self.cnt_files,
            self.cnt_rows_written,
            self.file_written.display()
        )
    }
}

impl fmt::Display for ReportMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MERGE]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_split_to_dict_and_format() {
        let report = ReportSplit {
            dir_output: PathBuf::from("out"),
            files_written: vec![PathBuf::from("out/a.xlsx"), PathBuf::from("out/b.xlsx")],
            cnt_rows_processed: 5,
            cnt_rows_skipped: 1,
            cnt_groups: 2,
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_files_written"], 2);
        assert_eq!(
            report.to_string(),
            "[SPLIT] rows=5 skipped=1 groups=2 files=2 dir=out"
        );
    }

    #[test]
    fn test_report_merge_format() {
        let report = ReportMerge {
            dir_output: PathBuf::from("out"),
            file_written: PathBuf::from("out/merged.xlsx"),
            cnt_files: 2,
            cnt_rows_written: 5,
        };
        assert_eq!(report.to_dict()["cnt_rows_written"], 5);
        assert!(report.format("[M]").starts_with("[M] files=2 rows=5"));
    }
}
